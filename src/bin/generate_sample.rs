//! Writes a synthetic NYPD-style shooting incident table as
//! `sample_shootings.csv` and `sample_shootings.parquet`.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const BOROUGHS: &[(&str, f64)] = &[
    ("BROOKLYN", 0.40),
    ("BRONX", 0.29),
    ("QUEENS", 0.14),
    ("MANHATTAN", 0.13),
    ("STATEN ISLAND", 0.04),
];

/// `None` stands for an empty PERP_RACE field.
const RACES: &[(Option<&str>, f64)] = &[
    (Some("BLACK"), 0.42),
    (None, 0.30),
    (Some("WHITE HISPANIC"), 0.09),
    (Some("BLACK HISPANIC"), 0.05),
    (Some("UNKNOWN"), 0.09),
    (Some("WHITE"), 0.02),
    (Some("ASIAN / PACIFIC ISLANDER"), 0.02),
    (Some("AMERICAN INDIAN/ALASKAN NATIVE"), 0.01),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Pick from a weighted table; weights need not sum to one.
    fn weighted<T: Copy>(&mut self, table: &[(T, f64)]) -> T {
        let total: f64 = table.iter().map(|(_, w)| w).sum();
        let mut target = self.next_f64() * total;
        for &(item, weight) in table {
            if target < weight {
                return item;
            }
            target -= weight;
        }
        table[table.len() - 1].0
    }
}

struct Incident {
    key: i64,
    date: NaiveDate,
    borough: &'static str,
    perp_race: Option<&'static str>,
}

fn generate(n: usize, start: NaiveDate, days: i64, rng: &mut SimpleRng) -> Vec<Incident> {
    let mut incidents: Vec<Incident> = (0..n)
        .map(|i| {
            let offset = (rng.next_f64() * days as f64) as i64;
            Incident {
                key: 200_000_000 + i as i64,
                date: start + Duration::days(offset),
                borough: rng.weighted(BOROUGHS),
                perp_race: rng.weighted(RACES),
            }
        })
        .collect();
    incidents.sort_by_key(|inc| inc.date);
    incidents
}

fn write_csv(path: &str, incidents: &[Incident]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["INCIDENT_KEY", "OCCUR_DATE", "BORO", "PERP_RACE"])?;
    for inc in incidents {
        writer.write_record([
            inc.key.to_string(),
            inc.date.format("%m/%d/%Y").to_string(),
            inc.borough.to_string(),
            inc.perp_race.unwrap_or_default().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, incidents: &[Incident]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("INCIDENT_KEY", DataType::Int64, false),
        Field::new("OCCUR_DATE", DataType::Date32, false),
        Field::new("BORO", DataType::Utf8, false),
        Field::new("PERP_RACE", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(incidents.iter().map(|i| i.key))),
            Arc::new(Date32Array::from_iter_values(
                incidents
                    .iter()
                    .map(|i| (i.date - epoch).num_days() as i32),
            )),
            Arc::new(StringArray::from_iter_values(incidents.iter().map(|i| i.borough))),
            Arc::new(StringArray::from_iter(incidents.iter().map(|i| i.perp_race))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).context("start date")?;
    let incidents = generate(1_500, start, 730, &mut rng);

    write_csv("sample_shootings.csv", &incidents)?;
    write_parquet("sample_shootings.parquet", &incidents)?;

    log::info!("Generated {} incidents", incidents.len());
    println!(
        "Wrote {} incidents to sample_shootings.csv and sample_shootings.parquet",
        incidents.len()
    );
    Ok(())
}
