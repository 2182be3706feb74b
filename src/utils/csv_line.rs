#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("unterminated quoted field")]
    UnterminatedQuote,
}

/// Splits one delimited row. A field may contain the separator only when it
/// is wrapped in double quotes; `""` inside a quoted field is a literal quote.
/// Whitespace before an opening quote is ignored.
pub fn split_line(line: &str, sep: char) -> Result<Vec<String>, SplitError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == sep {
            fields.push(std::mem::take(&mut field));
        } else if c == '"' && field.trim().is_empty() {
            field.clear();
            in_quotes = true;
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(SplitError::UnterminatedQuote);
    }
    fields.push(field);
    Ok(fields)
}

pub fn escape_field(value: &str, sep: char) -> String {
    if value.contains(sep) || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn join_row<I, S>(values: I, sep: char) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| escape_field(v.as_ref(), sep))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
