use crate::error::PathSyntaxError;
use std::fmt;

/// The index a path chunk selects within a sequence, or the absence of one.
///
/// Surface syntax is 1-based (`Source[2]`), `#` for the last element, and
/// `*` for every element; the internal representation is 0-based with no
/// sentinel integer for *last* — a closed enum variant rules out a stray
/// `-1` slipping through arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Absent,
    All,
    Last,
    Num(usize),
}

/// One segment of a path: a name plus an optional index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub name: String,
    pub index: Index,
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match self.index {
            Index::Absent => Ok(()),
            Index::All => write!(f, "[*]"),
            Index::Last => write!(f, "[#]"),
            Index::Num(n) => write!(f, "[{}]", n + 1),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses one dot-delimited chunk, e.g. `Source`, `Source[2]`, `Source[*]`, `Source[#]`.
fn parse_chunk(raw: &str, whole_path: &str) -> Result<Chunk, PathSyntaxError> {
    if raw.is_empty() {
        return Err(PathSyntaxError::EmptyChunk(whole_path.to_string()));
    }
    let malformed = || PathSyntaxError::MalformedChunk {
        path: whole_path.to_string(),
        chunk: raw.to_string(),
    };

    match raw.find('[') {
        None => {
            if raw.chars().all(is_name_char) {
                Ok(Chunk {
                    name: raw.to_string(),
                    index: Index::Absent,
                })
            } else {
                Err(malformed())
            }
        }
        Some(open) => {
            if !raw.ends_with(']') {
                return Err(malformed());
            }
            let name = &raw[..open];
            let inner = &raw[open + 1..raw.len() - 1];
            if name.is_empty() || !name.chars().all(is_name_char) {
                return Err(malformed());
            }
            let index = match inner {
                "*" => Index::All,
                "#" => Index::Last,
                digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                    let n: usize =
                        digits
                            .parse()
                            .map_err(|_| PathSyntaxError::InvalidIndex {
                                chunk: raw.to_string(),
                                index: digits.to_string(),
                            })?;
                    if n == 0 {
                        return Err(PathSyntaxError::InvalidIndex {
                            chunk: raw.to_string(),
                            index: digits.to_string(),
                        });
                    }
                    // Surface syntax is 1-based; internal representation is 0-based.
                    Index::Num(n - 1)
                }
                _ => {
                    return Err(PathSyntaxError::InvalidIndex {
                        chunk: raw.to_string(),
                        index: inner.to_string(),
                    })
                }
            };
            Ok(Chunk {
                name: name.to_string(),
                index,
            })
        }
    }
}

/// Parses a dot-delimited path string into a non-empty sequence of chunks.
pub fn parse(s: &str) -> Result<Vec<Chunk>, PathSyntaxError> {
    if s.is_empty() {
        return Err(PathSyntaxError::Empty);
    }
    s.split('.').map(|piece| parse_chunk(piece, s)).collect()
}

/// Joins a chunk sequence's names with `.`, dropping every index. Used to
/// key the domain-typing field registry so `Source[2].IP4[1]` and
/// `Source.IP4` resolve to the same entry.
pub fn normalized_name(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_name() {
        let chunks = parse("Source").unwrap();
        assert_eq!(
            chunks,
            vec![Chunk {
                name: "Source".into(),
                index: Index::Absent
            }]
        );
    }

    #[test]
    fn parses_numeric_index_as_zero_based() {
        let chunks = parse("Source[2]").unwrap();
        assert_eq!(chunks[0].index, Index::Num(1));
    }

    #[test]
    fn parses_last_and_wildcard() {
        assert_eq!(parse("A[#]").unwrap()[0].index, Index::Last);
        assert_eq!(parse("A[*]").unwrap()[0].index, Index::All);
    }

    #[test]
    fn parses_multi_chunk_path() {
        let chunks = parse("Source[2].IP4[1]").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].name, "Source");
        assert_eq!(chunks[1].name, "IP4");
    }

    #[test]
    fn rejects_malformed_chunks() {
        assert!(parse("Source[").is_err());
        assert!(parse("Source[abc]").is_err());
        assert!(parse("Sou rce").is_err());
        assert!(parse("").is_err());
        assert!(parse("A[0]").is_err());
    }

    #[test]
    fn idempotent() {
        assert_eq!(parse("Source.IP4[#]"), parse("Source.IP4[#]"));
    }
}
