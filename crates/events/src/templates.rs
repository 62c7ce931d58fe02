//! Transactional email templates.
//!
//! Each [`EmailTemplate`] has a subject and a plain-text body with
//! `{{name}}` placeholders. [`EmailTemplate::render`] substitutes the
//! supplied variables into the subject and text body, and produces an HTML
//! body from the same text with every substituted value HTML-escaped.
//! Unknown placeholders render as empty strings.

use std::collections::HashMap;

/// Product name used in subjects.
const BRAND: &str = "Media Lab";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Vars: `name`, `username`, `login_url`.
    Welcome,
    /// Vars: `name`, `reset_url`, `expires_minutes`.
    PasswordReset,
    /// Vars: `name`, `request_title`, `status`, `note`, `request_url`.
    RequestStatus,
    /// Vars: `name`, `task_title`, `project_name`, `task_url`.
    TaskAssigned,
    /// Vars: `config_name`.
    SmtpTest,
}

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailTemplate {
    fn subject_template(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome to {{brand}}",
            Self::PasswordReset => "{{brand}}: reset your password",
            Self::RequestStatus => "{{brand}}: request \"{{request_title}}\" is now {{status}}",
            Self::TaskAssigned => "{{brand}}: new task \"{{task_title}}\"",
            Self::SmtpTest => "{{brand}}: SMTP test message",
        }
    }

    fn body_template(self) -> &'static str {
        match self {
            Self::Welcome => {
                "Hello {{name}},\n\n\
                 An account has been created for you with the username {{username}}.\n\
                 Sign in at {{login_url}}\n"
            }
            Self::PasswordReset => {
                "Hello {{name}},\n\n\
                 We received a request to reset your password.\n\
                 Use this link within {{expires_minutes}} minutes: {{reset_url}}\n\n\
                 If you did not ask for this, you can ignore this message.\n"
            }
            Self::RequestStatus => {
                "Hello {{name}},\n\n\
                 Your request \"{{request_title}}\" is now {{status}}.\n\
                 {{note}}\n\
                 Details: {{request_url}}\n"
            }
            Self::TaskAssigned => {
                "Hello {{name}},\n\n\
                 You have been assigned \"{{task_title}}\" in project {{project_name}}.\n\
                 Details: {{task_url}}\n"
            }
            Self::SmtpTest => {
                "This is a test message sent with the SMTP configuration \"{{config_name}}\".\n\
                 If you can read it, outgoing mail works.\n"
            }
        }
    }

    /// Render the template with `vars`.
    pub fn render(self, vars: &HashMap<&str, String>) -> RenderedEmail {
        let lookup = |key: &str| -> String {
            if key == "brand" {
                return BRAND.to_string();
            }
            vars.get(key).cloned().unwrap_or_default()
        };

        let subject = substitute(self.subject_template(), |k| lookup(k))
            .replace(['\r', '\n'], " ");
        let text = substitute(self.body_template(), |k| lookup(k));

        let html_body = substitute(&escape_html(self.body_template()), |k| {
            escape_html(&lookup(k))
        })
        .replace('\n', "<br>\n");
        let html = format!(
            "<!DOCTYPE html><html><body style=\"font-family:sans-serif\">{html_body}</body></html>"
        );

        RenderedEmail {
            subject,
            text,
            html,
        }
    }
}

/// Replace every `{{ key }}` in `template` with `value(key)`.
///
/// An unterminated `{{` is copied through unchanged.
pub fn substitute(template: &str, value: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                out.push_str(&value(after[..end].trim()));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn substitute_replaces_and_trims_keys() {
        let out = substitute("a {{x}} b {{ y }} c", |k| k.to_uppercase());
        assert_eq!(out, "a X b Y c");
    }

    #[test]
    fn substitute_keeps_unterminated_placeholder() {
        assert_eq!(substitute("hi {{name", |_| "x".into()), "hi {{name");
    }

    #[test]
    fn welcome_renders_text_and_html() {
        let rendered = EmailTemplate::Welcome.render(&vars(&[
            ("name", "Ana"),
            ("username", "ana"),
            ("login_url", "http://localhost:5173/login"),
        ]));
        assert_eq!(rendered.subject, "Welcome to Media Lab");
        assert!(rendered.text.contains("Hello Ana,"));
        assert!(rendered.text.contains("username ana"));
        assert!(rendered.html.contains("<br>"));
    }

    #[test]
    fn html_body_escapes_values() {
        let rendered = EmailTemplate::RequestStatus.render(&vars(&[
            ("name", "<script>alert(1)</script>"),
            ("request_title", "Poster & flyer"),
            ("status", "approved"),
        ]));
        assert!(rendered.html.contains("&lt;script&gt;"));
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("Poster &amp; flyer"));
        // Plain text is not escaped.
        assert!(rendered.text.contains("Poster & flyer"));
        assert_eq!(
            rendered.subject,
            "Media Lab: request \"Poster & flyer\" is now approved"
        );
    }

    #[test]
    fn missing_vars_render_empty() {
        let rendered = EmailTemplate::SmtpTest.render(&HashMap::new());
        assert!(rendered.text.contains("configuration \"\""));
    }

    #[test]
    fn subject_strips_newlines() {
        let rendered =
            EmailTemplate::TaskAssigned.render(&vars(&[("task_title", "a\r\nBcc: x@y")]));
        assert!(!rendered.subject.contains('\n'));
        assert!(!rendered.subject.contains('\r'));
    }
}
