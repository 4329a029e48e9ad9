//! TwiML voice script read to the applicant when the call connects.

const QUESTION_PAUSE_SECS: u32 = 5;

/// Greeting, one `<Say>` + `<Pause>` per question, then a sign-off.
pub fn render_call_script(applicant_name: &str, listing_name: &str, questions: &[String]) -> String {
    let first_name = applicant_name.split_whitespace().next().unwrap_or("there");
    let mut twiml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

    twiml.push_str(&say(&format!(
        "Hello {first_name}, thank you for applying for the {listing_name} position. \
         I have a few short questions for you. Please answer after each one."
    )));
    for question in questions {
        twiml.push_str(&say(question));
        twiml.push_str(&format!(r#"<Pause length="{QUESTION_PAUSE_SECS}"/>"#));
    }
    twiml.push_str(&say(
        "Thank you for your time. Our team will be in touch with next steps. Goodbye.",
    ));
    twiml.push_str("</Response>");
    twiml
}

fn say(text: &str) -> String {
    format!("<Say>{}</Say>", xml_escape(text))
}

pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_greets_and_asks_every_question() {
        let questions = vec![
            "Why Rust?".to_string(),
            "Describe a Postgres outage you handled.".to_string(),
        ];
        let twiml = render_call_script("Ada Lovelace", "Backend Engineer", &questions);

        assert!(twiml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
        assert!(twiml.ends_with("</Response>"));
        assert!(twiml.contains("Hello Ada,"));
        assert!(twiml.contains("<Say>Why Rust?</Say>"));
        assert_eq!(twiml.matches("<Pause").count(), 2);
        assert_eq!(twiml.matches("<Say>").count(), 4);
    }

    #[test]
    fn test_script_escapes_xml() {
        let twiml = render_call_script(
            "Bob",
            "R&D <Lead>",
            &["Is \"C\" > 'D'?".to_string()],
        );
        assert!(twiml.contains("R&amp;D &lt;Lead&gt;"));
        assert!(twiml.contains("<Say>Is &quot;C&quot; &gt; &apos;D&apos;?</Say>"));
        assert!(!twiml.contains("<Lead>"));
    }

    #[test]
    fn test_script_without_name_or_questions() {
        let twiml = render_call_script("  ", "Analyst", &[]);
        assert!(twiml.contains("Hello there,"));
        assert_eq!(twiml.matches("<Pause").count(), 0);
    }
}
