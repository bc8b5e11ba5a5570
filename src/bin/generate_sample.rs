use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const MALLS: [&str; 6] = [
    "Kanyon",
    "Forum Istanbul",
    "Metrocity",
    "Metropol AVM",
    "Istinye Park",
    "Mall of Istanbul",
];

/// Category name and unit price.
const CATEGORIES: [(&str, f64); 8] = [
    ("Clothing", 300.08),
    ("Shoes", 600.17),
    ("Books", 15.15),
    ("Cosmetics", 40.66),
    ("Food & Beverage", 5.23),
    ("Toys", 35.84),
    ("Technology", 1050.0),
    ("Souvenir", 11.73),
];

const PAYMENT_METHODS: [&str; 3] = ["Cash", "Credit Card", "Debit Card"];

const ROWS: usize = 5000;

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

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }
}

struct Row {
    invoice_no: String,
    customer_id: String,
    gender: &'static str,
    age: i64,
    category: &'static str,
    quantity: i64,
    price: f64,
    payment_method: &'static str,
    invoice_date: NaiveDate,
    mall: &'static str,
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let first_day = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
    let span_days = 797; // through 2023-03-08

    (0..ROWS)
        .map(|i| {
            let (category, unit_price) = *rng.pick(&CATEGORIES);
            let quantity = 1 + rng.below(5) as i64;
            Row {
                invoice_no: format!("I{}", 100_000 + i),
                customer_id: format!("C{}", 100_000 + rng.below(900_000)),
                gender: if rng.below(10) < 6 { "Female" } else { "Male" },
                age: 18 + rng.below(52) as i64,
                category,
                quantity,
                price: (unit_price * quantity as f64 * 100.0).round() / 100.0,
                payment_method: *rng.pick(&PAYMENT_METHODS),
                invoice_date: first_day + Duration::days(rng.below(span_days) as i64),
                mall: *rng.pick(&MALLS),
            }
        })
        .collect()
}

fn write_csv(rows: &[Row], path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "invoice_no",
        "customer_id",
        "gender",
        "age",
        "category",
        "quantity",
        "price",
        "payment_method",
        "invoice_date",
        "shopping_mall",
    ])?;
    for r in rows {
        writer.write_record([
            r.invoice_no.clone(),
            r.customer_id.clone(),
            r.gender.to_string(),
            r.age.to_string(),
            r.category.to_string(),
            r.quantity.to_string(),
            format!("{:.2}", r.price),
            r.payment_method.to_string(),
            r.invoice_date.format("%d/%m/%Y").to_string(),
            r.mall.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> anyhow::Result<()> {
    let text = |f: fn(&Row) -> String| StringArray::from(rows.iter().map(f).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("invoice_no", DataType::Utf8, false),
        Field::new("customer_id", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("age", DataType::Int64, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("price", DataType::Float64, false),
        Field::new("payment_method", DataType::Utf8, false),
        Field::new("invoice_date", DataType::Utf8, false),
        Field::new("shopping_mall", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|r| r.invoice_no.clone())),
            Arc::new(text(|r| r.customer_id.clone())),
            Arc::new(text(|r| r.gender.to_string())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
            Arc::new(text(|r| r.category.to_string())),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.quantity).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.price).collect::<Vec<_>>(),
            )),
            Arc::new(text(|r| r.payment_method.to_string())),
            Arc::new(text(|r| r.invoice_date.format("%d/%m/%Y").to_string())),
            Arc::new(text(|r| r.mall.to_string())),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sample_transactions.csv")?;
    write_parquet(&rows, "sample_transactions.parquet")?;

    println!(
        "Wrote {} transactions across {} malls to sample_transactions.csv / .parquet",
        rows.len(),
        MALLS.len()
    );
    Ok(())
}
