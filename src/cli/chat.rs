use std::io::{self, Write};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::{ChatClient, Conversation, FALLBACK_REPLY, TurnOutcome};

pub async fn run(url: &str, api_key: Option<&str>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let mut client = ChatClient::new(url);
    if let Some(api_key) = api_key {
        client = client.with_api_key(api_key);
    }

    let mut conversation = Conversation::default();
    if let Some(greeting) = conversation.messages().first() {
        println!("{}\n", greeting.content);
    }

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let mut stdout = io::stdout();
                let outcome = conversation
                    .submit(&client, &line, |delta| {
                        let _ = write!(stdout, "{}", delta);
                        let _ = stdout.flush();
                    })
                    .await;

                match outcome {
                    TurnOutcome::Replied(_) => println!("\n"),
                    TurnOutcome::NoReply => println!(),
                    TurnOutcome::Failed => println!("{}\n", FALLBACK_REPLY),
                    TurnOutcome::Ignored => {}
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
