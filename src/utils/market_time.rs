use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

/// BSE 所在时区（UTC+5:30），日终文件按该时区的日期命名
pub const MARKET_TZ: Tz = Kolkata;

pub fn market_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&MARKET_TZ).date_naive()
}

/// 触发时刻对应的“昨天”，即需要拉取的日终文件日期
pub fn previous_market_day(now: DateTime<Utc>) -> NaiveDate {
    let today = market_today(now);
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}
