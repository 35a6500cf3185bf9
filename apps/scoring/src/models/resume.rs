use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// One job in the candidate's history. Dates are kept as the parser produced
/// them (`2021-03`, `2021-03-15`, `2021`); `end_date` may be `"present"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub summary: String,
}

impl WorkExperience {
    pub fn is_current(&self) -> bool {
        is_present_marker(&self.end_date)
    }

    pub fn start(&self) -> Option<NaiveDate> {
        parse_resume_date(&self.start_date)
    }

    /// End date, with `"present"` resolved to `today`.
    pub fn end(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.is_current() {
            Some(today)
        } else {
            parse_resume_date(&self.end_date)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub major: String,
}

/// Parsed resume as delivered on `resume.parsed`. Read-only input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDto {
    pub contact_info: ContactInfo,
    pub skills: Vec<String>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
}

fn is_present_marker(raw: &str) -> bool {
    let raw = raw.trim().to_lowercase();
    raw.is_empty() || matches!(raw.as_str(), "present" | "current" | "now" | "至今")
}

/// Parses `YYYY-MM-DD`, `YYYY-MM`, `YYYY/MM`, `YYYY.MM` or `YYYY`.
/// Partial dates resolve to the first day of the period.
pub fn parse_resume_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = raw.split(['-', '/', '.']).map(str::trim);
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Whole calendar months from `start` to `end` (negative when `end` precedes `start`).
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_resume_date_formats() {
        assert_eq!(parse_resume_date("2021-03-15"), Some(d(2021, 3, 15)));
        assert_eq!(parse_resume_date("2021-03"), Some(d(2021, 3, 1)));
        assert_eq!(parse_resume_date("2021/11"), Some(d(2021, 11, 1)));
        assert_eq!(parse_resume_date("2019"), Some(d(2019, 1, 1)));
        assert_eq!(parse_resume_date("soon"), None);
        assert_eq!(parse_resume_date("2021-13"), None);
    }

    #[test]
    fn test_present_end_resolves_to_today() {
        let job = WorkExperience {
            start_date: "2020-01".to_string(),
            end_date: "Present".to_string(),
            ..Default::default()
        };
        assert!(job.is_current());
        assert_eq!(job.end(d(2024, 6, 1)), Some(d(2024, 6, 1)));
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(d(2020, 1, 1), d(2021, 3, 1)), 14);
        assert_eq!(months_between(d(2020, 5, 1), d(2020, 2, 1)), -3);
    }

    #[test]
    fn test_resume_deserializes_camel_case() {
        let json = r#"{
            "contactInfo": {"name": "A. Chen", "email": "a@example.com"},
            "skills": ["Rust"],
            "workExperience": [{"company": "Acme", "position": "Engineer", "startDate": "2020-01", "endDate": "present"}]
        }"#;
        let resume: ResumeDto = serde_json::from_str(json).unwrap();
        assert_eq!(resume.contact_info.email.as_deref(), Some("a@example.com"));
        assert_eq!(resume.work_experience[0].company, "Acme");
        assert!(resume.education.is_empty());
    }
}
