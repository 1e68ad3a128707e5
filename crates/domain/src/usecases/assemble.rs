//! Digest assembly - joins section reports into the final mail document

use crate::model::{Digest, SectionReport};

const DATE_PLACEHOLDER: &str = "{date}";

/// Fixed framing text of the digest. `{date}` is replaced by the run date.
#[derive(Debug, Clone)]
pub struct DigestTemplate {
    pub subject: String,
    pub greeting: String,
    pub intro: String,
    pub closing: String,
}

impl Default for DigestTemplate {
    fn default() -> Self {
        Self {
            subject: "Your daily China briefing – {date}".to_string(),
            greeting: "Good morning,".to_string(),
            intro: "📅 Your daily China briefing for {date}".to_string(),
            closing: "Have a successful day!".to_string(),
        }
    }
}

/// Builds a [`Digest`] from section reports
pub struct DigestAssembler {
    template: DigestTemplate,
}

impl DigestAssembler {
    pub fn new(template: DigestTemplate) -> Self {
        Self { template }
    }

    /// Assemble the digest. Output depends only on the reports, their order
    /// and `run_date`.
    pub fn assemble(&self, reports: &[SectionReport], run_date: &str) -> Digest {
        let mut lines: Vec<String> = Vec::new();

        lines.push(fill_date(&self.template.greeting, run_date));
        if !self.template.intro.is_empty() {
            lines.push(String::new());
            lines.push(fill_date(&self.template.intro, run_date));
        }
        lines.push(String::new());

        for report in reports {
            lines.push(report.header.clone());
            lines.extend(report.lines());
            lines.push(String::new());
        }

        lines.push(fill_date(&self.template.closing, run_date));

        Digest {
            subject: fill_date(&self.template.subject, run_date),
            body: lines.join("\n"),
            sections: reports.iter().map(SectionReport::status).collect(),
        }
    }
}

impl Default for DigestAssembler {
    fn default() -> Self {
        Self::new(DigestTemplate::default())
    }
}

fn fill_date(text: &str, run_date: &str) -> String {
    text.replace(DATE_PLACEHOLDER, run_date)
}
