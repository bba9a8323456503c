use std::io::Write;
use std::process::{Command, Stdio};

use super::{ProcessingError, TextExtractor};

/// Used when handwriting conversion is on and no `ocrCommand` is set
pub const DEFAULT_OCR_COMMAND: &str = "tesseract stdin stdout";

/// Runs an external OCR program: page image on stdin, text on stdout
#[derive(Debug, Clone)]
pub struct CommandTextExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandTextExtractor {
    /// Parse a whitespace-separated command line such as
    /// `tesseract stdin stdout --psm 6`
    pub fn from_command_line(command_line: &str) -> Result<Self, ProcessingError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ProcessingError::ExtractorNotFound("empty OCR command".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TextExtractor for CommandTextExtractor {
    fn extract_text(&self, image: &[u8]) -> Result<String, ProcessingError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessingError::ExtractorNotFound(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ProcessingError::Recognition(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        log::debug!("OCR: recognized {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_parsing() {
        let extractor = CommandTextExtractor::from_command_line(DEFAULT_OCR_COMMAND).unwrap();
        assert_eq!(extractor.program(), "tesseract");
        assert_eq!(extractor.args, vec!["stdin", "stdout"]);

        assert!(CommandTextExtractor::from_command_line("   ").is_err());
    }

    #[test]
    fn test_missing_program_is_reported() {
        let extractor =
            CommandTextExtractor::from_command_line("scribe-sync-no-such-ocr-program").unwrap();
        assert!(matches!(
            extractor.extract_text(b"png"),
            Err(ProcessingError::ExtractorNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_is_captured() {
        // `cat` echoes the "image" back as recognized text
        let extractor = CommandTextExtractor::from_command_line("cat").unwrap();
        assert_eq!(extractor.extract_text(b"  hello page \n").unwrap(), "hello page");
    }
}
