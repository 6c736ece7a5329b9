//! Holiday/workday calendar service.
//!
//! Keeps a sparse per-year override table mapping short dates (`MM-DD`) to a
//! tri-state: `true` = legal holiday, `false` = compensatory workday (a
//! weekend that must be worked around a holiday), absent = plain
//! weekday/weekend rules apply. The table is fetched lazily per year from an
//! HTTP source and cached on disk; a fetch failure degrades to the weekday
//! heuristic instead of surfacing an error.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Cache entries older than this are discarded and refetched.
const CACHE_MAX_AGE_DAYS: i64 = 30;

type YearTable = HashMap<String, bool>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct YearEntry {
    #[serde(default)]
    data: YearTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HolidayCache {
    #[serde(default)]
    last_update: Option<String>,
    #[serde(flatten)]
    years: HashMap<String, YearEntry>,
}

/// Response shape of `GET {base}/api/holiday/year/{year}`.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    holiday: HashMap<String, ApiHolidayInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiHolidayInfo {
    holiday: Option<bool>,
}

pub struct HolidayCalendar {
    api_base: String,
    cache_file: PathBuf,
    cache: RwLock<HolidayCache>,
    client: reqwest::Client,
}

impl HolidayCalendar {
    pub fn new(api_base: String, cache_file: PathBuf) -> Self {
        let cache = Self::load_cache(&cache_file);
        Self {
            api_base,
            cache_file,
            cache: RwLock::new(cache),
            client: reqwest::Client::new(),
        }
    }

    fn load_cache(path: &PathBuf) -> HolidayCache {
        if !path.exists() {
            return HolidayCache::default();
        }
        let cache: HolidayCache = match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| Ok(serde_json::from_str(&text)?))
        {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to load holiday cache, starting empty");
                return HolidayCache::default();
            }
        };

        if let Some(ref last_update) = cache.last_update {
            if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(last_update) {
                let age = Local::now().signed_duration_since(ts);
                if age.num_days() > CACHE_MAX_AGE_DAYS {
                    info!("holiday cache is stale, will refetch");
                    return HolidayCache::default();
                }
            }
        }
        cache
    }

    async fn save_cache(&self) {
        let json = {
            let mut cache = self.cache.write().await;
            cache.last_update = Some(Local::now().to_rfc3339());
            match serde_json::to_string(&*cache) {
                Ok(j) => j,
                Err(e) => {
                    warn!(error = %e, "failed to serialize holiday cache");
                    return;
                }
            }
        };
        if let Some(parent) = self.cache_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.cache_file, json) {
            warn!(error = %e, "failed to write holiday cache");
        }
    }

    /// Override table for one year, fetched and cached on first use.
    /// An empty table (fetch failure, unknown year) means "no overrides".
    pub async fn fetch_year(&self, year: i32) -> YearTable {
        let year_key = year.to_string();
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.years.get(&year_key) {
                return entry.data.clone();
            }
        }

        let url = format!("{}/api/holiday/year/{}", self.api_base, year);
        let table = match self.fetch_table(&url).await {
            Ok(t) => t,
            Err(e) => {
                warn!(year, error = %e, "holiday fetch failed, falling back to weekday rules");
                return YearTable::new();
            }
        };

        {
            let mut cache = self.cache.write().await;
            cache
                .years
                .insert(year_key, YearEntry { data: table.clone() });
        }
        self.save_cache().await;
        table
    }

    async fn fetch_table(&self, url: &str) -> anyhow::Result<YearTable> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("holiday source returned status {}", resp.status());
        }
        let body: ApiResponse = resp.json().await?;
        if body.code != 0 {
            anyhow::bail!("holiday source returned code {}", body.code);
        }
        Ok(body
            .holiday
            .into_iter()
            .filter_map(|(date, info)| info.holiday.map(|h| (date, h)))
            .collect())
    }

    /// True when `date` is a legal holiday: an override entry of `true`, or an
    /// uncovered Saturday/Sunday.
    pub async fn is_holiday(&self, date: NaiveDate) -> bool {
        let table = self.fetch_year(date.year()).await;
        let short = date.format("%m-%d").to_string();
        if let Some(&flag) = table.get(&short) {
            debug!(date = %date, flag, "holiday override hit");
            return flag;
        }
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// True when `date` is a workday: an override entry of `false`
    /// (compensatory workday), or an uncovered Monday through Friday.
    pub async fn is_workday(&self, date: NaiveDate) -> bool {
        let table = self.fetch_year(date.year()).await;
        let short = date.format("%m-%d").to_string();
        if let Some(&flag) = table.get(&short) {
            debug!(date = %date, flag, "holiday override hit");
            return !flag;
        }
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}
