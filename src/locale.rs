/// User-facing strings. Brazilian Portuguese is the default audience.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl Locale {
    /// Parse a language tag such as `pt-BR`, `pt_BR`, `en` or `en-US`.
    /// Unknown tags fall back to the default.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Locale::En,
            "pt" => Locale::PtBr,
            _ => {
                tracing::warn!(tag, "unknown locale, using pt-BR");
                Locale::PtBr
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Locale::PtBr => "⛅ ChatBot EdN c/ AWS Bedrock",
            Locale::En => "⛅ EdN ChatBot on AWS Bedrock",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Locale::PtBr => "Qual sua dúvida? > ",
            Locale::En => "What is your question? > ",
        }
    }

    pub fn waiting(&self) -> &'static str {
        match self {
            Locale::PtBr => "Por favor aguarde um momento...",
            Locale::En => "Please wait a moment...",
        }
    }

    pub fn history_header(&self) -> &'static str {
        match self {
            Locale::PtBr => "Histórico do Chat:",
            Locale::En => "Chat history:",
        }
    }

    pub fn user_label(&self) -> &'static str {
        match self {
            Locale::PtBr => "Usuário",
            Locale::En => "You",
        }
    }

    pub fn assistant_label(&self) -> &'static str {
        "ChatBot"
    }

    pub fn help(&self) -> &'static str {
        match self {
            Locale::PtBr => "Comandos: /history mostra o histórico, /quit encerra.",
            Locale::En => "Commands: /history shows the transcript, /quit exits.",
        }
    }

    /// Inline text shown in place of an answer when the model call fails.
    pub fn invocation_failed(&self, detail: &str) -> String {
        match self {
            Locale::PtBr => format!("Erro ao chamar o modelo: {detail}"),
            Locale::En => format!("Error calling the model: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn parses_language_tags() {
        assert_eq!(Locale::from_tag("pt-BR"), Locale::PtBr);
        assert_eq!(Locale::from_tag("pt_BR"), Locale::PtBr);
        assert_eq!(Locale::from_tag("EN-us"), Locale::En);
        assert_eq!(Locale::from_tag("fr"), Locale::PtBr);
    }

    #[test]
    fn failure_text_embeds_detail() {
        assert_eq!(
            Locale::PtBr.invocation_failed("boom"),
            "Erro ao chamar o modelo: boom"
        );
        assert!(Locale::En.invocation_failed("boom").ends_with("boom"));
    }
}
