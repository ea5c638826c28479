//! Mail bodies: the administrator notification and the localized
//! acknowledgment sent back to the submitter.

use postern_common::{Language, SubmittedForm};

/// Rendered acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoReply {
    pub subject: String,
    pub body: String,
    /// Text returned to the submitter's browser on success
    pub success_text: String,
}

/// Subject and plain-text body of the administrator notification.
///
/// Fields are copied verbatim; the body is plain text so nothing is escaped.
pub fn render_admin_notification(form: &SubmittedForm) -> (String, String) {
    let subject = format!("Prise de contact de {}", form.name);
    let body = format!(
        "Nom: {}\nEmail: {}\nTel: {}\nMessage:\n{}",
        form.name, form.email, form.phone, form.message
    );
    (subject, body)
}

/// Localized HTML acknowledgment. `brand` signs the message.
pub fn render_auto_reply(name: &str, message: &str, language: Language, brand: &str) -> AutoReply {
    let name = escape_html(name);
    let message = escape_html(message).replace('\n', "<br>");

    let (subject, greeting, thanks, follow_up, signature) = match language {
        Language::Nl => (
            "Automatisch antwoord",
            "Hallo",
            "Bedankt voor uw bericht! We hebben uw aanvraag ontvangen.",
            "We nemen zo snel mogelijk contact met u op.",
            format!("— Het {brand}-team"),
        ),
        Language::En => (
            "Automatic reply",
            "Hello",
            "Thank you for contacting us! We have received your message.",
            "We will get back to you as soon as possible.",
            format!("— The {brand} team"),
        ),
        Language::Fr => (
            "Réponse automatique",
            "Bonjour",
            "Merci de nous avoir contactés ! Nous avons bien reçu votre message.",
            "Nous reviendrons vers vous dans les plus brefs délais.",
            format!("— L’équipe {brand}"),
        ),
    };

    let body = format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px;">
	<h2>{greeting} {name},</h2>
	<p>{thanks}</p>
	<blockquote style="border-left: 4px solid #e80000; margin: 10px 0; padding-left: 10px;">{message}</blockquote>
	<p>{follow_up}</p>
	<p style="font-size:12px; color:#888;">{signature}</p>
</div>"#,
        signature = escape_html(&signature),
    );

    AutoReply {
        subject: subject.to_string(),
        body,
        success_text: success_text(language).to_string(),
    }
}

/// Success text for a language without rendering a full reply
pub fn success_text(language: Language) -> &'static str {
    match language {
        Language::Nl => "Je bericht is goed ontvangen.",
        Language::En => "Your message has been received.",
        Language::Fr => "Votre message a bien été envoyé.",
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
