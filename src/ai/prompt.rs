//! Reusable templates using Handlebars. Values rendered with double
//! braces are HTML escaped, which is what the contact email needs
//! since every field comes straight from a visitor. The system
//! preamble uses triple braces because it is plain text.

use std::fmt;

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

#[derive(Debug)]
pub enum Prompt {
    SystemPreamble,
    ContactEmail,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// Implement the Into trait so that Prompt can be converted to an &str
impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const SYSTEM_PREAMBLE: &str = r"
You are an AI assistant representing {{{owner}}}'s portfolio. Your role is to positively promote {{{owner}}}'s capabilities, skills, and potential to visitors.

## Response Guidelines
1. Always be positive and promotional about {{{owner}}}'s abilities
2. Highlight relevant skills and projects based on the question
3. If asked about something {{{owner}}} hasn't done yet, emphasize the willingness and ability to learn quickly
4. Encourage visitors to reach out via the contact form
5. Be professional but friendly and approachable
6. Keep responses concise but informative
7. If asked inappropriate questions, politely redirect to portfolio-related topics
";

const CONTACT_EMAIL: &str = r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333; border-bottom: 2px solid #6366f1; padding-bottom: 10px;">
    New Contact Form Submission
  </h2>
  <div style="background: #f8fafc; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p style="margin: 0 0 10px 0;"><strong style="color: #6366f1;">From:</strong> {{name}}</p>
    <p style="margin: 0 0 10px 0;">
      <strong style="color: #6366f1;">Email:</strong>
      <a href="mailto:{{email}}" style="color: #333;">{{email}}</a>
    </p>
    <p style="margin: 0;"><strong style="color: #6366f1;">Subject:</strong> {{subject}}</p>
  </div>
  <div style="background: #fff; padding: 20px; border: 1px solid #e2e8f0; border-radius: 8px;">
    <h3 style="color: #333; margin-top: 0;">Message:</h3>
    <p style="color: #555; line-height: 1.6; white-space: pre-wrap;">{{message}}</p>
  </div>
  <p style="color: #888; font-size: 12px; margin-top: 20px; text-align: center;">
    This message was sent from your portfolio contact form.
  </p>
</div>
"#;

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_template_string(&Prompt::SystemPreamble.to_string(), SYSTEM_PREAMBLE)?;
    registry.register_template_string(&Prompt::ContactEmail.to_string(), CONTACT_EMAIL)?;
    Ok(registry)
}

/// The instruction prepended to every conversation sent upstream.
pub fn system_preamble(owner: &str) -> Result<String> {
    let rendered = templates()?.render(
        &Prompt::SystemPreamble.to_string(),
        &json!({ "owner": owner }),
    )?;
    Ok(rendered.trim().to_string())
}

/// HTML body of the email sent for a contact form submission.
pub fn contact_email_html(name: &str, email: &str, subject: &str, message: &str) -> Result<String> {
    let rendered = templates()?.render(
        &Prompt::ContactEmail.to_string(),
        &json!({
            "name": name,
            "email": email,
            "subject": subject,
            "message": message,
        }),
    )?;
    Ok(rendered)
}
