//! Record and token splitting for delimited data blocks.

/// One token of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Written between single quotes
    pub quoted: bool,
}

impl Token {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Split a data block into non-empty records, trimmed of surrounding
/// whitespace. Quoted text may contain the record separator.
pub fn split_records(data: &str, separator: Option<char>) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quote = false;

    for (position, c) in data.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '\n' if separator.is_none() => {
                records.push(&data[start..position]);
                start = position + 1;
                in_quote = false;
            }
            _ if Some(c) == separator && !in_quote => {
                records.push(&data[start..position]);
                start = position + c.len_utf8();
            }
            _ => {}
        }
    }
    records.push(&data[start..]);

    records
        .into_iter()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect()
}

/// Split one record into tokens. With no separator, runs of whitespace
/// separate tokens. Returns an error message for an unterminated quote.
pub fn tokenize(record: &str, separator: Option<char>) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quote = false;
    let mut pending = false;

    for c in record.chars() {
        if in_quote {
            if c == '\'' {
                in_quote = false;
            } else {
                current.push(c);
            }
            continue;
        }

        let is_separator = match separator {
            Some(sep) => c == sep,
            None => c.is_whitespace(),
        };

        if is_separator {
            if separator.is_some() || pending {
                tokens.push(finish(&mut current, &mut quoted));
            }
            pending = false;
        } else if c == '\'' {
            in_quote = true;
            quoted = true;
            pending = true;
        } else {
            current.push(c);
            pending = true;
        }
    }

    if in_quote {
        return Err("unterminated quoted text".to_string());
    }
    if pending || separator.is_some() {
        tokens.push(finish(&mut current, &mut quoted));
    }

    Ok(tokens)
}

fn finish(current: &mut String, quoted: &mut bool) -> Token {
    let text = if *quoted {
        std::mem::take(current)
    } else {
        std::mem::take(current).trim().to_string()
    };
    let token = Token {
        text,
        quoted: *quoted,
    };
    *quoted = false;
    token
}
