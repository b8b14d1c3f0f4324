use chrono::NaiveDate;
use shootings_explorer::{
    BoroughSelection, CellValue, ColumnMap, Dataset, FilterSelection, apply_filter,
    borough_race_pivot, count, monthly_time_series, race_value_counts, summarize,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn incidents(rows: &[(NaiveDate, &str, Option<&str>)]) -> Dataset {
    Dataset::new(
        vec!["OCCUR_DATE".into(), "BORO".into(), "PERP_RACE".into()],
        rows.iter()
            .map(|&(date, boro, race)| {
                vec![
                    CellValue::Date(date),
                    CellValue::String(boro.to_string()),
                    race.map_or(CellValue::Null, |r| CellValue::String(r.to_string())),
                ]
            })
            .collect(),
    )
}

fn three_rows() -> Dataset {
    incidents(&[
        (ymd(2020, 1, 15), "BRONX", Some("BLACK")),
        (ymd(2020, 1, 20), "BRONX", Some("WHITE")),
        (ymd(2020, 2, 1), "QUEENS", Some("BLACK")),
    ])
}

#[test]
fn january_across_all_boroughs() {
    let ds = three_rows();
    let cols = ColumnMap::default();
    let sel = FilterSelection::new(ymd(2020, 1, 1), ymd(2020, 1, 31), BoroughSelection::All);
    let view = apply_filter(&ds, &cols, &sel).unwrap();

    assert_eq!(count(&view), 2);

    let series = monthly_time_series(&view).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].month.to_string(), "2020-01");
    assert_eq!(series[0].count, 2);

    let pivot = borough_race_pivot(&view).unwrap();
    assert_eq!(pivot.row_labels, vec!["BRONX"]);
    assert_eq!(pivot.column_labels, vec!["BLACK", "WHITE"]);
    assert_eq!(pivot.get("BRONX", "BLACK"), 1);
    assert_eq!(pivot.get("BRONX", "WHITE"), 1);

    let races: Vec<(String, usize)> = race_value_counts(&view)
        .unwrap()
        .into_iter()
        .map(|vc| (vc.value, vc.count))
        .collect();
    assert_eq!(races, vec![("BLACK".to_string(), 1), ("WHITE".to_string(), 1)]);
}

#[test]
fn full_range_in_queens() {
    let ds = three_rows();
    let cols = ColumnMap::default();
    let sel = FilterSelection::initial(&ds, &cols);
    let sel = FilterSelection {
        borough: BoroughSelection::from_label("QUEENS"),
        ..sel
    };
    let summary = summarize(&ds, &cols, &sel);

    assert_eq!(summary.total, 1);
    assert_eq!(summary.rows, vec![2]);
    assert_eq!(summary.pivot.row_labels, vec!["QUEENS"]);
    assert_eq!(summary.pivot.column_labels, vec!["BLACK"]);
    assert_eq!(summary.pivot.counts, vec![vec![1]]);
}

#[test]
fn single_day_selection_on_one_row() {
    let ds = incidents(&[(ymd(2021, 6, 30), "MANHATTAN", None)]);
    let cols = ColumnMap::default();
    let sel = FilterSelection::new(ymd(2021, 6, 30), ymd(2021, 6, 30), BoroughSelection::All);
    let summary = summarize(&ds, &cols, &sel);

    assert_eq!(summary.total, 1);
    assert_eq!(summary.monthly.len(), 1);
    assert_eq!(summary.monthly[0].month.to_string(), "2021-06");
    assert_eq!(summary.monthly[0].count, 1);
    assert_eq!(summary.pivot.get("MANHATTAN", "<null>"), 1);
}

#[test]
fn inverted_range_yields_nothing() {
    let ds = three_rows();
    let cols = ColumnMap::default();
    let sel = FilterSelection::new(ymd(2020, 2, 1), ymd(2020, 1, 1), BoroughSelection::All);
    let summary = summarize(&ds, &cols, &sel);

    assert_eq!(summary.total, 0);
    assert!(summary.rows.is_empty());
    assert!(summary.monthly.is_empty());
    assert!(summary.pivot.is_empty());
    assert!(summary.race_counts.is_empty());
}

// ---------------------------------------------------------------------------
// Properties over a pseudo-random dataset
// ---------------------------------------------------------------------------

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

const BOROUGHS: &[&str] = &["BRONX", "BROOKLYN", "MANHATTAN", "QUEENS", "STATEN ISLAND"];
const RACES: &[Option<&str>] = &[Some("BLACK"), Some("WHITE"), Some("WHITE HISPANIC"), Some("UNKNOWN"), None];

fn random_dataset(rng: &mut SimpleRng, n: usize) -> Dataset {
    let start = ymd(2019, 1, 1);
    let rows: Vec<(NaiveDate, &str, Option<&str>)> = (0..n)
        .map(|_| {
            (
                start + chrono::Duration::days(rng.below(3 * 365) as i64),
                BOROUGHS[rng.below(BOROUGHS.len() as u64) as usize],
                RACES[rng.below(RACES.len() as u64) as usize],
            )
        })
        .collect();
    incidents(&rows)
}

fn random_selection(rng: &mut SimpleRng) -> FilterSelection {
    let start = ymd(2018, 10, 1);
    let a = start + chrono::Duration::days(rng.below(4 * 365) as i64);
    let b = start + chrono::Duration::days(rng.below(4 * 365) as i64);
    let borough = match rng.below(BOROUGHS.len() as u64 + 1) as usize {
        0 => BoroughSelection::All,
        i => BoroughSelection::Only(BOROUGHS[i - 1].to_string()),
    };
    FilterSelection::new(a, b, borough)
}

/// Independent reference filter over the raw rows.
fn naive_count(ds: &Dataset, sel: &FilterSelection) -> usize {
    ds.rows
        .iter()
        .filter(|row| {
            let date = match &row[0] {
                CellValue::Date(d) => *d,
                _ => return false,
            };
            let borough_ok = match &sel.borough {
                BoroughSelection::All => true,
                BoroughSelection::Only(b) => row[1] == CellValue::String(b.clone()),
            };
            borough_ok && sel.date_start <= date && date <= sel.date_end
        })
        .count()
}

#[test]
fn aggregates_agree_with_count_and_reference_filter() {
    let mut rng = SimpleRng::new(7);
    let ds = random_dataset(&mut rng, 600);
    let cols = ColumnMap::default();

    for _ in 0..200 {
        let sel = random_selection(&mut rng);
        let view = apply_filter(&ds, &cols, &sel).unwrap();
        let n = count(&view);

        assert_eq!(n, naive_count(&ds, &sel), "selection {sel:?}");
        assert_eq!(view.refine(&sel).unwrap().indices(), view.indices());
        assert!(view.indices().windows(2).all(|w| w[0] < w[1]));

        let monthly = monthly_time_series(&view).unwrap();
        assert_eq!(monthly.iter().map(|m| m.count).sum::<usize>(), n);
        assert!(monthly.windows(2).all(|w| w[0].month < w[1].month));
        assert!(monthly.iter().all(|m| m.count > 0));

        assert_eq!(borough_race_pivot(&view).unwrap().total(), n);

        let races = race_value_counts(&view).unwrap();
        assert_eq!(races.iter().map(|vc| vc.count).sum::<usize>(), n);
        assert!(races.windows(2).all(|w| w[0].count >= w[1].count));
    }
}

#[test]
fn repeated_summaries_are_identical() {
    let mut rng = SimpleRng::new(11);
    let ds = random_dataset(&mut rng, 300);
    let cols = ColumnMap::default();
    let sel = random_selection(&mut rng).normalized();

    let first = summarize(&ds, &cols, &sel);
    let second = summarize(&ds, &cols, &sel);
    assert_eq!(first, second);
}
