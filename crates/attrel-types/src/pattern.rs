//! Date patterns in the `SimpleDateFormat` letter syntax.
//!
//! Patterns are translated once into chrono strftime text. The translation
//! also records which calendar fields the pattern carries so parsing can
//! default the missing ones (midnight, January 1st 1970).

use crate::datetime::DateError;

/// A translated date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
    fields: Fields,
}

/// Which fields a pattern binds when parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fields {
    pub year: bool,
    pub month: bool,
    pub day: bool,
    pub hour: bool,
    pub hour12: bool,
    pub am_pm: bool,
    pub minute: bool,
    pub second: bool,
    pub offset: bool,
    /// `z`: chrono can print zone names but not read them back.
    pub zone_name: bool,
}

impl DatePattern {
    /// Translate a pattern such as `yyyy-MM-dd HH:mm:ss.SSS`.
    ///
    /// Letters outside `yMdDEuaHhmsSzZX` are rejected. Text in single quotes
    /// is literal and `''` is a quote.
    pub fn compile(pattern: &str) -> Result<Self, DateError> {
        let invalid = |reason: String| DateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let chars: Vec<char> = pattern.chars().collect();
        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut fields = Fields::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    strftime.push('\'');
                    i += 2;
                    continue;
                }
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err(invalid("unterminated quote".to_string())),
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            strftime.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(&lit) => {
                            push_literal(&mut strftime, lit);
                            j += 1;
                        }
                    }
                }
                i = j + 1;
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            i += run;

            let spec = match (c, run) {
                ('y', 2) => "%y",
                ('y', _) => "%Y",
                ('M', 1) => "%-m",
                ('M', 2) => "%m",
                ('M', 3) => "%b",
                ('M', _) => "%B",
                ('d', 1) => "%-d",
                ('d', _) => "%d",
                ('D', 1) => "%-j",
                ('D', _) => "%j",
                ('E', 1..=3) => "%a",
                ('E', _) => "%A",
                ('u', _) => "%u",
                ('a', _) => "%p",
                ('H', 1) => "%-H",
                ('H', _) => "%H",
                ('h', 1) => "%-I",
                ('h', _) => "%I",
                ('m', 1) => "%-M",
                ('m', _) => "%M",
                ('s', 1) => "%-S",
                ('s', _) => "%S",
                ('S', 1..=3) => "%3f",
                ('z', _) => "%Z",
                ('Z', _) => "%z",
                ('X', 1 | 2) => "%z",
                ('X', _) => "%:z",
                _ => {
                    return Err(invalid(format!(
                        "unsupported field '{}'",
                        c.to_string().repeat(run)
                    )));
                }
            };
            strftime.push_str(spec);

            match c {
                'y' => fields.year = true,
                'M' => fields.month = true,
                'd' => fields.day = true,
                'D' => {
                    fields.month = true;
                    fields.day = true;
                }
                'H' => fields.hour = true,
                'h' => fields.hour12 = true,
                'a' => fields.am_pm = true,
                'm' => fields.minute = true,
                's' => fields.second = true,
                'Z' | 'X' => fields.offset = true,
                'z' => fields.zone_name = true,
                _ => {}
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
            fields,
        })
    }

    /// The pattern as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The chrono strftime equivalent.
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn fields(&self) -> Fields {
        self.fields
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("yyyy-MM-dd", "%Y-%m-%d")]
    #[case("yyyy/MM/dd HH:mm:ss.SSS", "%Y/%m/%d %H:%M:%S.%3f")]
    #[case("EEE MMM dd HH:mm:ss zzz yyyy", "%a %b %d %H:%M:%S %Z %Y")]
    #[case("hh:mm a", "%I:%M %p")]
    #[case("d/M/yy", "%-d/%-m/%y")]
    #[case("yyyy-MM-dd'T'HH:mm:ssXXX", "%Y-%m-%dT%H:%M:%S%:z")]
    #[case("h 'o''clock'", "%-I o'clock")]
    #[case("100%", "100%%")]
    #[case("EEEE, MMMM d", "%A, %B %-d")]
    fn translates(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(DatePattern::compile(pattern).unwrap().strftime(), expected);
    }

    #[rstest]
    #[case("yyyy-QQ")]
    #[case("'open")]
    #[case("kk:mm")]
    fn rejects(#[case] pattern: &str) {
        assert!(matches!(
            DatePattern::compile(pattern),
            Err(DateError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn records_fields() {
        let fields = DatePattern::compile("yyyy-MM-dd hh a").unwrap().fields();
        assert!(fields.year && fields.month && fields.day);
        assert!(fields.hour12 && fields.am_pm);
        assert!(!fields.hour && !fields.minute && !fields.offset);
        assert!(!fields.zone_name);
        assert!(DatePattern::compile("HH:mm zzz").unwrap().fields().zone_name);
    }
}
