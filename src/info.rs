use crate::refs::{ObjectReferences, RefType};
use chrono::{DateTime, Datelike, FixedOffset, Local, Offset, Timelike};
use pdf_writer::{Date as PDate, Pdf, TextStr};

/// Metadata written into the generated newsletter's information dictionary
#[derive(Default, Debug, Clone)]
pub struct Info {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Adobe Acrobat suggests a comma separated list
    pub keywords: Option<String>,
    /// Defaults to the moment the document is written
    pub created: Option<DateTime<FixedOffset>>,
}

impl Info {
    /// Metadata for one issue of a newsletter, e.g. `"Dahlia Wood"` and `"October 2026"`
    pub fn for_issue(publication: &str, month: &str) -> Info {
        Info {
            title: Some(format!("{publication} Newsletter - {month}")),
            author: Some(publication.to_string()),
            subject: Some(format!("{publication} news and events for {month}")),
            keywords: Some(format!("{publication}, newsletter, {month}")),
            created: None,
        }
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) {
        let id = refs.gen(RefType::Info);
        let mut info = writer.document_info(id);

        if let Some(title) = &self.title {
            info.title(TextStr(title.as_str()));
        }
        if let Some(author) = &self.author {
            info.author(TextStr(author.as_str()));
        }
        if let Some(subject) = &self.subject {
            info.subject(TextStr(subject.as_str()));
        }
        if let Some(keywords) = &self.keywords {
            info.keywords(TextStr(keywords.as_str()));
        }
        info.creator(TextStr(concat!(
            env!("CARGO_PKG_NAME"),
            " v",
            env!("CARGO_PKG_VERSION")
        )));

        let created = self.created.unwrap_or_else(|| {
            let now = Local::now();
            now.with_timezone(&now.offset().fix())
        });
        info.creation_date(pdf_date(&created));
    }
}

fn pdf_date(when: &DateTime<FixedOffset>) -> PDate {
    let offset = when.offset().local_minus_utc();
    let offset_hours = offset / (60 * 60);
    let offset_minutes = ((offset - (offset_hours * (60 * 60))) / 60).abs();
    PDate::new(when.year() as u16)
        .month(when.month() as u8)
        .day(when.day() as u8)
        .hour(when.hour() as u8)
        .minute(when.minute() as u8)
        .second(when.second() as u8)
        .utc_offset_hour(offset_hours as i8)
        .utc_offset_minute(offset_minutes as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_metadata_names_the_month() {
        let info = Info::for_issue("Dahlia Wood", "October 2026");
        assert_eq!(
            info.title.as_deref(),
            Some("Dahlia Wood Newsletter - October 2026")
        );
        assert_eq!(info.author.as_deref(), Some("Dahlia Wood"));
        assert_eq!(
            info.keywords.as_deref(),
            Some("Dahlia Wood, newsletter, October 2026")
        );
    }

    #[test]
    fn writes_the_fixed_creation_date() {
        let mut info = Info::for_issue("Dahlia Wood", "October 2026");
        info.created = DateTime::parse_from_rfc3339("2026-10-15T09:30:00-06:00").ok();

        let mut refs = ObjectReferences::new();
        let mut writer = Pdf::new();
        info.write(&mut refs, &mut writer);
        let bytes = writer.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("D:20261015093000"));
        assert!(refs.get(RefType::Info).is_some());
    }
}
