use chrono::NaiveDate;
use sqlx::FromRow;

/// One diary entry, at most one per calendar date.
#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct Article {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub message: String,
}

impl Article {
    /// Placeholder for a day without a stored entry.
    pub fn blank(year: i32, month: u32, day: u32) -> Self {
        Article {
            year,
            month,
            day,
            message: String::new(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Heading like "March 3, 2026 (Tue)".
    pub fn heading(&self) -> String {
        match self.date() {
            Some(date) => date.format("%B %-d, %Y (%a)").to_string(),
            None => format!("{}-{:02}-{:02}", self.year, self.month, self.day),
        }
    }

    /// Anchor id like "d20260303", stable across renders.
    pub fn anchor(&self) -> String {
        format!("d{:04}{:02}{:02}", self.year, self.month, self.day)
    }

    pub fn is_blank(&self) -> bool {
        self.message.is_empty()
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.message.lines()
    }

    /// First line of the message, shortened for table output.
    pub fn excerpt(&self) -> String {
        const MAX: usize = 60;
        let first = self.message.lines().next().unwrap_or("");
        match first.char_indices().nth(MAX) {
            Some((idx, _)) => format!("{}…", &first[..idx]),
            None => first.to_string(),
        }
    }
}
