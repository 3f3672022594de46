/// Cursor over a chat message's text.
///
/// `pos` is a byte offset and always sits on a char boundary, so slices handed back to the
/// caller are valid for any input (Cyrillic included).
#[derive(Debug)]
pub struct Lexer<'a> {
    pub input: &'a str,
    pub pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Checks the char under the cursor without advancing
    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advances past the char under the cursor and returns it
    pub fn next(&mut self) -> Option<char> {
        let ch = self.peek_char();
        if let Some(ch) = ch {
            self.pos += ch.len_utf8();
        }

        ch
    }

    /// Consumes `expected` if it is under the cursor, reporting whether it did
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.next();
            return true;
        }

        false
    }

    pub fn skip_whitespace(&mut self) {
        self.next_while(char::is_whitespace);
    }

    /// Consumes consecutive chars matching `pred`, returning them if there were any
    pub fn next_while<F>(&mut self, pred: F) -> Option<&'a str>
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }

            self.next();
        }

        if start == self.pos {
            None
        } else {
            Some(&self.input[start..self.pos])
        }
    }

    /// Consumes consecutive non-whitespace chars
    pub fn next_word(&mut self) -> Option<&'a str> {
        self.next_while(|ch| !ch.is_whitespace())
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_walks_multibyte_text() {
        let mut lexer = Lexer::new("!т 12");

        assert!(lexer.eat('!'));
        assert_eq!(lexer.next(), Some('т'));
        lexer.skip_whitespace();
        assert_eq!(lexer.next_while(|c| c.is_ascii_digit()), Some("12"));
        assert!(lexer.is_eof());
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_next_word_stops_at_whitespace() {
        let mut lexer = Lexer::new("/t@bot extra args");

        assert_eq!(lexer.next_word(), Some("/t@bot"));
        assert_eq!(lexer.peek_char(), Some(' '));
        assert!(!lexer.eat('x'));
    }
}
