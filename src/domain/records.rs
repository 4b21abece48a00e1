/// Token reader for level streams.
///
/// A level is a flat sequence of whitespace-separated tokens; `#` starts a
/// comment running to the end of the line. Each component pulls its own
/// fixed-shape records off a shared reader, so the same reader can feed the
/// player, platform and lava sections in order.
///
/// Every token remembers its line so errors point at the offending record.

use std::io::Read;

use crate::domain::geometry::{Rect, Rgba, Vec2};
use crate::error::{Error, Result};

pub struct TokenReader {
    tokens: Vec<(usize, String)>,
    pos: usize,
    last_line: usize,
}

impl TokenReader {
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        let mut tokens = vec![];
        let mut last_line = 1;
        for (i, line) in text.lines().enumerate() {
            let content = line.split('#').next().unwrap_or("");
            for tok in content.split_whitespace() {
                tokens.push((i + 1, tok.to_string()));
            }
            last_line = i + 1;
        }
        TokenReader { tokens, pos: 0, last_line }
    }

    /// Line of the next token (or the last line at end of input).
    pub fn line(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.last_line, |(l, _)| *l)
    }

    pub fn next_token(&mut self, what: &str) -> Result<(usize, &str)> {
        match self.tokens.get(self.pos) {
            Some((line, tok)) => {
                self.pos += 1;
                Ok((*line, tok.as_str()))
            }
            None => Err(Error::malformed(self.last_line, format!("unexpected end of input, expected {what}"))),
        }
    }

    pub fn f32(&mut self, what: &str) -> Result<f32> {
        let (line, tok) = self.next_token(what)?;
        match tok.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(Error::malformed(line, format!("expected {what} as a finite number, got `{tok}`"))),
        }
    }

    pub fn count(&mut self, what: &str) -> Result<usize> {
        let (line, tok) = self.next_token(what)?;
        tok.parse::<usize>()
            .map_err(|_| Error::malformed(line, format!("expected {what} as a non-negative integer, got `{tok}`")))
    }

    pub fn color(&mut self, what: &str) -> Result<Rgba> {
        let (line, tok) = self.next_token(what)?;
        Rgba::from_hex(tok)
            .ok_or_else(|| Error::malformed(line, format!("expected {what} as RRGGBB[AA] hex, got `{tok}`")))
    }

    pub fn vec2(&mut self, what: &str) -> Result<Vec2> {
        Ok(Vec2::new(self.f32(what)?, self.f32(what)?))
    }

    /// `x y w h` with non-negative size.
    pub fn rect(&mut self, what: &str) -> Result<Rect> {
        let line = self.line();
        let r = Rect::new(self.f32(what)?, self.f32(what)?, self.f32(what)?, self.f32(what)?);
        if r.w < 0.0 || r.h < 0.0 {
            return Err(Error::malformed(line, format!("{what} has negative size {}x{}", r.w, r.h)));
        }
        Ok(r)
    }

    /// Fails if any token is left unread.
    pub fn finish(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some((line, tok)) => Err(Error::malformed(*line, format!("unexpected trailing token `{tok}`"))),
        }
    }
}

/// Reserve room for `n` records up front, reporting exhaustion as an error.
pub fn reserve<T>(n: usize, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).map_err(|source| Error::Allocation { what, source })?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_lines() {
        let mut r = TokenReader::from_text("1 2 # three\n\n  4.5\n");
        assert_eq!(r.count("a").unwrap(), 1);
        assert_eq!(r.line(), 1);
        assert_eq!(r.f32("b").unwrap(), 2.0);
        assert_eq!(r.line(), 3);
        assert_eq!(r.f32("c").unwrap(), 4.5);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn eof_reports_last_line() {
        let mut r = TokenReader::from_text("1\n2\n");
        r.count("a").unwrap();
        r.count("b").unwrap();
        match r.f32("c") {
            Err(Error::MalformedLevelData { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(TokenReader::from_text("abc").f32("x").is_err());
        assert!(TokenReader::from_text("inf").f32("x").is_err());
        assert!(TokenReader::from_text("NaN").f32("x").is_err());
        assert!(TokenReader::from_text("-1").count("n").is_err());
    }

    #[test]
    fn rejects_negative_rect() {
        assert!(TokenReader::from_text("0 0 -1 5").rect("platform").is_err());
        assert_eq!(TokenReader::from_text("0 0 0 5").rect("platform").unwrap(), Rect::new(0.0, 0.0, 0.0, 5.0));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let mut r = TokenReader::from_text("1 extra");
        r.count("n").unwrap();
        assert!(matches!(r.finish(), Err(Error::MalformedLevelData { line: 1, .. })));
    }

    #[test]
    fn absurd_reservation_fails_cleanly() {
        let r: Result<Vec<[u64; 8]>> = reserve(usize::MAX / 2, "records");
        assert!(matches!(r, Err(Error::Allocation { .. })));
    }
}
