/// MessageTemplater renders the message of a legacy alert into the
/// template language of the alerting engine.
pub trait MessageTemplater {
    fn render(&self, message: &str) -> Result<String, TemplateError>;
}

/// TemplateError is a message which couldn't be fully migrated.
/// It carries a best-effort rendering which is still a safe template.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("variable starting at byte {offset} is not terminated")]
pub struct TemplateError {
    pub offset: usize,
    pub fallback: String,
}

/// LegacyTemplates migrates `${variable}` references of legacy messages
/// into lookups of the merged label values of the firing alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyTemplates;

// Preamble of migrated messages which reference variables.
const MERGED_LABELS_PREAMBLE: &str = "{{- $mergedLabels := mergeLabelValues $values -}}\n";

#[derive(Debug, PartialEq)]
enum Token<'s> {
    Literal(&'s str),
    Variable(&'s str),
}

impl MessageTemplater for LegacyTemplates {
    fn render(&self, message: &str) -> Result<String, TemplateError> {
        let (tokens, unterminated) = tokenize(message);
        let has_variables = tokens.iter().any(|t| matches!(t, Token::Variable(_)));

        let mut out = String::new();
        if has_variables {
            out.push_str(MERGED_LABELS_PREAMBLE);
        }
        for token in tokens {
            match token {
                Token::Literal(l) => out.push_str(&escape_literal(l)),
                Token::Variable(v) => {
                    out.push_str(&format!("{{{{index $mergedLabels {}}}}}", quote(v)));
                }
            }
        }

        match unterminated {
            None => Ok(out),
            Some(offset) => Err(TemplateError {
                offset,
                fallback: out,
            }),
        }
    }
}

/// Escape literal text so that it renders verbatim, even if it contains template actions.
pub fn escape_literal(literal: &str) -> String {
    if !literal.contains("{{") && !literal.contains("}}") {
        literal.to_string()
    } else if !literal.contains('`') {
        format!("{{{{`{literal}`}}}}")
    } else {
        format!("{{{{{}}}}}", quote(literal))
    }
}

// Quote `s` as a double-quoted template string literal.
fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

// Split a message into literals and `${variable}` references.
// An unterminated reference is kept as a literal, and its offset is returned.
fn tokenize(message: &str) -> (Vec<Token<'_>>, Option<usize>) {
    let mut tokens = Vec::new();
    let mut rest = message;
    let mut offset = 0;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            tokens.push(Token::Literal(rest));
            return (tokens, Some(offset + start));
        };
        if start != 0 {
            tokens.push(Token::Literal(&rest[..start]));
        }
        tokens.push(Token::Variable(&rest[start + 2..start + 2 + len]));

        let consumed = start + 2 + len + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    (tokens, None)
}
