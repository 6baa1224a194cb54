use std::fmt::Display;

use chrono::{Datelike, Months, NaiveDate};
use clap::Args;
use log::debug;
use postgres::Row;
use rust_decimal::Decimal;

use crate::{
    config::Config,
    error::{Error, Result},
    schema::{GREEN_TRIPDATA, TAXI_ZONE_LOOKUP},
};

/// Parameters of the fixed questions. The defaults are the October 2019
/// questions the tool was written for.
#[derive(Clone, Debug, Args)]
pub struct ReportOptions {
    /// Month searched for the longest trip, as YYYY-MM
    #[arg(long, default_value = "2019-10", value_parser = parse_month)]
    pub month: NaiveDate,

    /// Pickup date for the biggest pickup zones
    #[arg(long, default_value = "2019-10-18")]
    pub revenue_date: NaiveDate,

    /// A zone's summed total_amount must exceed this to be listed
    #[arg(long, default_value_t = 13000.0)]
    pub revenue_threshold: f64,

    /// How many pickup zones to list
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(i64).range(1..))]
    pub top_zones: i64,

    /// Pickup zone whose trips are searched for the largest tip
    #[arg(long, default_value = "East Harlem North")]
    pub tip_origin_zone: String,
}

pub fn parse_month(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
}

/// Half-open window `[first day of month, first day of next month)`.
pub fn month_window(month: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(month.year(), month.month(), 1)
        .ok_or(Error::MonthOutOfRange(month))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or(Error::MonthOutOfRange(month))?;
    Ok((start, end))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceBucket {
    Short,
    Medium,
    Long,
    ExtraLong,
    VeryLong,
}

/// Upper bounds (inclusive, miles) of every bucket but the last.
const BUCKET_BOUNDS: [f64; 4] = [1.0, 3.0, 7.0, 10.0];

impl DistanceBucket {
    pub const ALL: [DistanceBucket; 5] = [
        DistanceBucket::Short,
        DistanceBucket::Medium,
        DistanceBucket::Long,
        DistanceBucket::ExtraLong,
        DistanceBucket::VeryLong,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DistanceBucket::Short => "Short Trips (≤ 1 mile)",
            DistanceBucket::Medium => "Medium Trips (1–3 miles)",
            DistanceBucket::Long => "Long Trips (3–7 miles)",
            DistanceBucket::ExtraLong => "Extra Long Trips (7–10 miles)",
            DistanceBucket::VeryLong => "Very Long Trips (> 10 miles)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripSegmentation {
    counts: [i64; 5],
}

impl TripSegmentation {
    pub fn count(&self, bucket: DistanceBucket) -> i64 {
        self.counts[bucket as usize]
    }

    /// `(label, count)` in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        DistanceBucket::ALL
            .into_iter()
            .map(|bucket| (bucket.label(), self.count(bucket)))
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }

    pub fn answer_format(&self) -> String {
        self.counts
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Display for TripSegmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, count) in self.iter() {
            writeln!(f, "{label}: {count}")?;
        }
        write!(f, "Answer Format: {}", self.answer_format())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LongestTrip {
    pub pickup_date: NaiveDate,
    pub distance: f64,
}

impl Display for LongestTrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pickup Date: {}", self.pickup_date)?;
        write!(f, "Longest Trip Distance: {}", self.distance)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoneRevenue {
    pub zone: String,
    pub total_amount: Decimal,
}

impl Display for ZoneRevenue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone: {}, Total Amount: {}", self.zone, self.total_amount)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LargestTip {
    pub dropoff_zone: String,
    pub largest_tip: Decimal,
}

impl Display for LargestTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dropoff Zone: {}, Largest Tip: {}",
            self.dropoff_zone, self.largest_tip
        )
    }
}

/// Counts every trip into exactly one distance bucket in a single scan.
/// A missing distance counts as zero miles.
pub fn trip_segmentation(config: &Config) -> Result<TripSegmentation> {
    let sql = format!(
        "SELECT
            COUNT(*) FILTER (WHERE distance <= $1),
            COUNT(*) FILTER (WHERE distance > $1 AND distance <= $2),
            COUNT(*) FILTER (WHERE distance > $2 AND distance <= $3),
            COUNT(*) FILTER (WHERE distance > $3 AND distance <= $4),
            COUNT(*) FILTER (WHERE distance > $4)
        FROM (SELECT COALESCE(trip_distance, 0) AS distance FROM {trips}) t",
        trips = GREEN_TRIPDATA.ident()?,
    );
    let [b1, b2, b3, b4] = BUCKET_BOUNDS;
    let row = query_one(config, &sql, &[&b1, &b2, &b3, &b4])?;

    let mut counts = [0i64; 5];
    for (i, count) in counts.iter_mut().enumerate() {
        *count = row.try_get(i)?;
    }
    let segmentation = TripSegmentation { counts };
    debug!("segmented {} trips", segmentation.total());
    Ok(segmentation)
}

/// The pickup date within `month` whose longest trip is the longest overall.
/// Ties go to the earliest date.
pub fn longest_trip_day(config: &Config, month: NaiveDate) -> Result<Option<LongestTrip>> {
    let (start, end) = month_window(month)?;
    let sql = format!(
        "SELECT
            lpep_pickup_datetime::date AS pickup_date,
            MAX(trip_distance) AS longest_trip_distance
        FROM {trips}
        WHERE lpep_pickup_datetime >= $1::date
          AND lpep_pickup_datetime < $2::date
          AND trip_distance IS NOT NULL
        GROUP BY pickup_date
        ORDER BY longest_trip_distance DESC, pickup_date
        LIMIT 1",
        trips = GREEN_TRIPDATA.ident()?,
    );
    let rows = query(config, &sql, &[&start, &end])?;
    rows.first()
        .map(|row| -> Result<LongestTrip> {
            Ok(LongestTrip {
                pickup_date: row.try_get(0)?,
                distance: row.try_get(1)?,
            })
        })
        .transpose()
}

/// Pickup zones on `date` whose summed `total_amount` exceeds `threshold`,
/// highest first, at most `limit` of them.
pub fn top_pickup_zones(
    config: &Config,
    date: NaiveDate,
    threshold: f64,
    limit: i64,
) -> Result<Vec<ZoneRevenue>> {
    let sql = format!(
        "SELECT
            COALESCE(tz.Zone, 'Unknown') AS zone,
            ROUND(SUM(gt.total_amount)::numeric, 2) AS total_amount
        FROM {trips} gt
        JOIN {zones} tz ON gt.PULocationID = tz.LocationID
        WHERE gt.lpep_pickup_datetime::date = $1
        GROUP BY tz.Zone
        HAVING SUM(gt.total_amount) > $2
        ORDER BY SUM(gt.total_amount) DESC
        LIMIT $3",
        trips = GREEN_TRIPDATA.ident()?,
        zones = TAXI_ZONE_LOOKUP.ident()?,
    );
    query(config, &sql, &[&date, &threshold, &limit])?
        .iter()
        .map(|row| -> Result<ZoneRevenue> {
            Ok(ZoneRevenue {
                zone: row.try_get(0)?,
                total_amount: row.try_get(1)?,
            })
        })
        .collect()
}

/// The dropoff zone with the single largest tip among trips picked up in
/// the zone named `origin_zone`.
pub fn largest_tip(config: &Config, origin_zone: &str) -> Result<Option<LargestTip>> {
    let sql = format!(
        "SELECT
            COALESCE(tz.Zone, 'Unknown') AS dropoff_zone,
            ROUND(MAX(gt.tip_amount)::numeric, 2) AS largest_tip
        FROM {trips} gt
        JOIN {zones} tz ON gt.DOLocationID = tz.LocationID
        WHERE gt.PULocationID IN (
            SELECT LocationID FROM {zones} WHERE Zone = $1
        )
          AND gt.tip_amount IS NOT NULL
        GROUP BY tz.Zone
        ORDER BY MAX(gt.tip_amount) DESC, dropoff_zone
        LIMIT 1",
        trips = GREEN_TRIPDATA.ident()?,
        zones = TAXI_ZONE_LOOKUP.ident()?,
    );
    let rows = query(config, &sql, &[&origin_zone])?;
    rows.first()
        .map(|row| -> Result<LargestTip> {
            Ok(LargestTip {
                dropoff_zone: row.try_get(0)?,
                largest_tip: row.try_get(1)?,
            })
        })
        .transpose()
}

type Params<'a> = [&'a (dyn postgres::types::ToSql + Sync)];

// Every report runs on its own short-lived connection.
fn query(config: &Config, sql: &str, params: &Params<'_>) -> Result<Vec<Row>> {
    debug!("{sql}");
    let mut client = config.connect()?;
    Ok(client.query(sql, params)?)
}

fn query_one(config: &Config, sql: &str, params: &Params<'_>) -> Result<Row> {
    debug!("{sql}");
    let mut client = config.connect()?;
    Ok(client.query_one(sql, params)?)
}
