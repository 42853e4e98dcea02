use async_trait::async_trait;
use std::path::Path;

use crate::inspect::traits::{FileHandler, HandlerError};
use crate::model::InfoEntry;
use crate::traits::{CommandRunner, CommandSpec};

/// Document fields through poppler's `pdfinfo`.
pub struct PdfHandler;

pub(crate) fn pdfinfo_command(path: &Path) -> CommandSpec {
    CommandSpec::new("pdfinfo").arg(path)
}

/// One entry per `Key: value` line. Values keep their own colons.
pub fn parse_pdfinfo(output: &str) -> Vec<InfoEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let (key, value) = (key.trim(), value.trim());
            (!key.is_empty() && !value.is_empty()).then(|| InfoEntry::new(key, value))
        })
        .collect()
}

#[async_trait]
impl FileHandler for PdfHandler {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_handle(&self, description: &str) -> bool {
        description.contains("PDF")
    }

    fn handles_mime(&self, mime: &str) -> bool {
        mime == "application/pdf"
    }

    async fn inspect(
        &self,
        path: &Path,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError> {
        let output = runner.run(&pdfinfo_command(path)).await?;
        Ok(parse_pdfinfo(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const PDFINFO: &str = "\
Title:           Quarterly Report
Producer:        pdfTeX-1.40.25
CreationDate:    Mon Jan  1 10:00:00 2024 UTC
Keywords:        
Tagged:          no
Pages:           3
Page size:       612 x 792 pts (letter)
PDF version:     1.5
";

    #[test]
    fn test_parse_pdfinfo() {
        let entries = parse_pdfinfo(PDFINFO);
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();

        assert_eq!(
            keys,
            vec!["Title", "Producer", "CreationDate", "Tagged", "Pages", "Page size", "PDF version"]
        );
        assert_eq!(entries[2].value, "Mon Jan  1 10:00:00 2024 UTC");
        assert_eq!(entries[5].value, "612 x 792 pts (letter)");
    }

    #[test]
    fn test_parse_ignores_lines_without_separator() {
        assert!(parse_pdfinfo("Syntax Warning without colon\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_inspect_runs_pdfinfo() {
        let path = Path::new("/docs/report.pdf");
        let runner = ScriptedRunner::default().respond(pdfinfo_command(path), PDFINFO);

        let entries = PdfHandler.inspect(path, &runner).await.unwrap();
        assert_eq!(entries.len(), 7);
        assert_eq!(runner.calls(), vec!["pdfinfo /docs/report.pdf".to_string()]);
    }
}
