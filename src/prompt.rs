//! Interactive configuration prompts.
//!
//! Each prompt shows a label and its default, then reads one line. Anything
//! that does not parse as an unsigned integer (including an empty line or end
//! of input) keeps the default.

use std::io::{self, BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
    echo: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// `echo = false` reads answers without printing the prompt text.
    pub fn new(input: R, output: W, echo: bool) -> Self {
        Self {
            input,
            output,
            echo,
        }
    }

    pub fn read_value(&mut self, label: &str, default: usize) -> io::Result<usize> {
        if self.echo {
            write!(self.output, "\n{label} [{default}]: ")?;
            self.output.flush()?;
        }

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(default);
        }
        Ok(line.trim().parse().unwrap_or(default))
    }

    /// Use `given` if present, otherwise prompt for the value.
    pub fn value_or_prompt(
        &mut self,
        given: Option<usize>,
        label: &str,
        default: usize,
    ) -> io::Result<usize> {
        match given {
            Some(v) => Ok(v),
            None => self.read_value(label, default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), true)
    }

    #[test]
    fn test_reads_number() {
        let mut p = prompter("42\n");
        assert_eq!(p.read_value("iterations", 7).unwrap(), 42);
        assert_eq!(String::from_utf8(p.output).unwrap(), "\niterations [7]: ");
    }

    #[test]
    fn test_explicit_zero() {
        let mut p = prompter("0\n");
        assert_eq!(p.read_value("threads", 16).unwrap(), 0);
    }

    #[test]
    fn test_empty_line_keeps_default() {
        let mut p = prompter("\n");
        assert_eq!(p.read_value("threads", 16).unwrap(), 16);
    }

    #[test]
    fn test_garbage_keeps_default() {
        let mut p = prompter("lots\n");
        assert_eq!(p.read_value("threads", 16).unwrap(), 16);
    }

    #[test]
    fn test_eof_keeps_default() {
        let mut p = prompter("");
        assert_eq!(p.read_value("heap size (# of blocks)", 1000).unwrap(), 1000);
    }

    #[test]
    fn test_sequence_and_given_values() {
        let mut p = prompter("100\n\n5\n");
        assert_eq!(p.value_or_prompt(None, "heap", 1).unwrap(), 100);
        assert_eq!(p.value_or_prompt(Some(9), "iterations", 2).unwrap(), 9);
        assert_eq!(p.value_or_prompt(None, "threads", 3).unwrap(), 3);
        assert_eq!(p.value_or_prompt(None, "foreign", 4).unwrap(), 5);
    }

    #[test]
    fn test_silent() {
        let mut p = Prompter::new(Cursor::new(b"3\n".to_vec()), Vec::new(), false);
        assert_eq!(p.read_value("threads", 1).unwrap(), 3);
        assert!(p.output.is_empty());
    }
}
