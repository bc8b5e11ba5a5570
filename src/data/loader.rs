use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Gender, Transaction, TransactionDataset};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 10] = [
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
];

/// Date format of the `invoice_date` column, e.g. `05/08/2022`.
pub const INVOICE_DATE_FORMAT: &str = "%d/%m/%Y";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transactions dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the [`REQUIRED_COLUMNS`] (recommended)
/// * `.json`    – `[{ "invoice_no": "I1", "gender": "Female", ... }, ...]`
/// * `.parquet` – one column per field; `invoice_date` as text or Date32
///
/// Rows whose fields cannot be parsed are dropped and counted in
/// [`TransactionDataset::skipped_rows`].
pub fn load_file(path: &Path) -> Result<TransactionDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            load_csv(file)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            load_json(&text)?
        }
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if dataset.skipped_rows > 0 {
        log::warn!(
            "{}: skipped {} malformed row(s)",
            path.display(),
            dataset.skipped_rows
        );
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row conversion shared by the text formats
// ---------------------------------------------------------------------------

/// One row as it appears in CSV / JSON, before validation.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(deserialize_with = "as_text")]
    invoice_no: String,
    #[serde(deserialize_with = "as_text")]
    customer_id: String,
    gender: String,
    age: u32,
    category: String,
    quantity: u32,
    price: f64,
    payment_method: String,
    invoice_date: String,
    shopping_mall: String,
}

/// Accept identifiers written either as strings or as bare numbers.
fn as_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Int(i64),
    }
    Ok(match Text::deserialize(deserializer)? {
        Text::Str(s) => s,
        Text::Int(i) => i.to_string(),
    })
}

impl RawTransaction {
    fn into_transaction(self) -> Result<Transaction> {
        let gender: Gender = self.gender.parse()?;
        let invoice_date = parse_invoice_date(&self.invoice_date)?;
        if !self.price.is_finite() {
            bail!("price {} is not finite", self.price);
        }
        Ok(Transaction {
            invoice_no: self.invoice_no,
            customer_id: self.customer_id,
            gender,
            age: self.age,
            category: self.category,
            quantity: self.quantity,
            price: self.price,
            payment_method: self.payment_method,
            invoice_date,
            mall: self.shopping_mall,
        })
    }
}

fn parse_invoice_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), INVOICE_DATE_FORMAT)
        .with_context(|| format!("'{s}' is not a DD/MM/YYYY date"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming at least the [`REQUIRED_COLUMNS`], in any
/// order. Extra columns are ignored.
pub fn load_csv<R: Read>(input: R) -> Result<TransactionDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers().context("reading CSV headers")?.clone();

    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            bail!("CSV missing '{col}' column");
        }
    }

    let mut transactions = Vec::new();
    let mut skipped = 0;

    for (row_no, result) in reader.deserialize::<RawTransaction>().enumerate() {
        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(RawTransaction::into_transaction);
        match parsed {
            Ok(t) => transactions.push(t),
            Err(e) => {
                log::debug!("CSV row {row_no}: {e:#}");
                skipped += 1;
            }
        }
    }

    Ok(TransactionDataset::from_transactions(transactions, skipped))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "invoice_no": "I138884", "customer_id": "C241288",
///     "gender": "Female", "age": 28, "category": "Clothing",
///     "quantity": 5, "price": 1500.4, "payment_method": "Credit Card",
///     "invoice_date": "5/8/2022", "shopping_mall": "Kanyon"
///   },
///   ...
/// ]
/// ```
pub fn load_json(text: &str) -> Result<TransactionDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut transactions = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (i, rec) in records.iter().enumerate() {
        let parsed = serde_json::from_value::<RawTransaction>(rec.clone())
            .map_err(anyhow::Error::from)
            .and_then(RawTransaction::into_transaction);
        match parsed {
            Ok(t) => transactions.push(t),
            Err(e) => {
                log::debug!("JSON row {i}: {e:#}");
                skipped += 1;
            }
        }
    }

    Ok(TransactionDataset::from_transactions(transactions, skipped))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of transactions.
///
/// Expected schema: one column per [`REQUIRED_COLUMNS`] entry. Text columns
/// are Utf8/LargeUtf8, `age`/`quantity` any 32/64-bit integer, `price`
/// Float64/Float32, `invoice_date` either Date32 or DD/MM/YYYY text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<TransactionDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut transactions = Vec::new();
    let mut skipped = 0;
    let mut base = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = ParquetColumns::locate(&batch)?;

        for row in 0..batch.num_rows() {
            match columns.transaction(row) {
                Ok(t) => transactions.push(t),
                Err(e) => {
                    log::debug!("Parquet row {}: {e:#}", base + row);
                    skipped += 1;
                }
            }
        }
        base += batch.num_rows();
    }

    Ok(TransactionDataset::from_transactions(transactions, skipped))
}

/// The required columns of one record batch, in [`REQUIRED_COLUMNS`] order.
struct ParquetColumns {
    cols: Vec<Arc<dyn Array>>,
}

impl ParquetColumns {
    fn locate(batch: &RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let cols = REQUIRED_COLUMNS
            .iter()
            .map(|name| {
                schema
                    .index_of(name)
                    .map(|i| batch.column(i).clone())
                    .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cols })
    }

    fn transaction(&self, row: usize) -> Result<Transaction> {
        let c = &self.cols;
        let age = extract_i64(&c[3], row).context("age")?;
        let quantity = extract_i64(&c[5], row).context("quantity")?;
        let price = extract_f64(&c[6], row).context("price")?;
        if !price.is_finite() {
            bail!("price {price} is not finite");
        }

        Ok(Transaction {
            invoice_no: extract_text(&c[0], row).context("invoice_no")?,
            customer_id: extract_text(&c[1], row).context("customer_id")?,
            gender: extract_text(&c[2], row).context("gender")?.parse()?,
            age: u32::try_from(age).context("age out of range")?,
            category: extract_text(&c[4], row).context("category")?,
            quantity: u32::try_from(quantity).context("quantity out of range")?,
            price,
            payment_method: extract_text(&c[7], row).context("payment_method")?,
            invoice_date: extract_date(&c[8], row).context("invoice_date")?,
            mall: extract_text(&c[9], row).context("shopping_mall")?,
        })
    }
}

// -- Parquet / Arrow helpers --

fn extract_text(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 | DataType::Int64 => Ok(extract_i64(col, row)?.to_string()),
        other => bail!("expected text column, got {other:?}"),
    }
}

fn extract_i64(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row))
        }
        other => bail!("expected integer column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 | DataType::Int64 => Ok(extract_i64(col, row)? as f64),
        other => bail!("expected numeric column, got {other:?}"),
    }
}

fn extract_date(col: &Arc<dyn Array>, row: usize) -> Result<NaiveDate> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Date32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Date32Array>()
                .context("expected Date32Array")?;
            arr.value_as_date(row).context("date out of range")
        }
        _ => parse_invoice_date(&extract_text(col, row)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "invoice_no,customer_id,gender,age,category,quantity,price,payment_method,invoice_date,shopping_mall";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn csv_rows_parse_into_transactions() {
        let csv = format!(
            "{HEADER}\n\
             I138884,C241288,Female,28,Clothing,5,1500.4,Credit Card,5/8/2022,Kanyon\n\
             I317333,C111565,Male,21,Shoes,3,1800.51,Debit Card,12/12/2021,Forum Istanbul\n"
        );
        let ds = load_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.skipped_rows, 0);
        assert_eq!(ds.malls, vec!["Forum Istanbul", "Kanyon"]);

        let first = &ds.transactions[0];
        assert_eq!(first.gender, Gender::Female);
        assert_eq!(first.age, 28);
        assert_eq!(first.quantity, 5);
        assert_eq!(first.price, 1500.4);
        assert_eq!(first.invoice_date, date(2022, 8, 5));
        assert_eq!(ds.transactions[1].invoice_date, date(2021, 12, 12));
    }

    #[test]
    fn malformed_csv_rows_are_skipped_and_counted() {
        let csv = format!(
            "{HEADER}\n\
             I1,C1,Female,28,Books,1,15.15,Cash,01/01/2022,Kanyon\n\
             I2,C2,Female,28,Books,1,not-a-price,Cash,01/01/2022,Kanyon\n\
             I3,C3,Female,28,Books,1,15.15,Cash,2022-01-01,Kanyon\n\
             I4,C4,Unknown,28,Books,1,15.15,Cash,01/01/2022,Kanyon\n\
             I5,C5,Male,-3,Books,1,15.15,Cash,01/01/2022,Kanyon\n\
             I6,C6,Male,40,Books,1,15.15,Cash,31/12/2022,Kanyon\n"
        );
        let ds = load_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.skipped_rows, 4);
        assert_eq!(ds.transactions[1].invoice_no, "I6");
    }

    #[test]
    fn csv_column_order_does_not_matter() {
        let csv = "shopping_mall,invoice_date,price,age,gender,category,quantity,payment_method,customer_id,invoice_no\n\
                   Kanyon,10/03/2023,300.0,64,Male,Toys,2,Cash,C9,I9\n";
        let ds = load_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.transactions[0].mall, "Kanyon");
        assert_eq!(ds.transactions[0].age, 64);
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let csv = "invoice_no,gender,age\nI1,Male,30\n";
        let err = load_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("customer_id"));
    }

    #[test]
    fn json_records_parse_and_bad_rows_are_skipped() {
        let json = r#"[
            {"invoice_no": "I1", "customer_id": 241288, "gender": "Female", "age": 28,
             "category": "Clothing", "quantity": 5, "price": 1500.4,
             "payment_method": "Credit Card", "invoice_date": "05/08/2022",
             "shopping_mall": "Kanyon"},
            {"invoice_no": "I2", "customer_id": "C2", "gender": "Male", "age": "old",
             "category": "Shoes", "quantity": 1, "price": 600.0,
             "payment_method": "Cash", "invoice_date": "05/08/2022",
             "shopping_mall": "Kanyon"}
        ]"#;
        let ds = load_json(json).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.skipped_rows, 1);
        assert_eq!(ds.transactions[0].customer_id, "241288");
    }

    #[test]
    fn json_must_be_an_array() {
        assert!(load_json(r#"{"invoice_no": "I1"}"#).is_err());
    }

    // -- Parquet --

    use arrow::array::ArrayRef;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    /// Write `columns` as a single-batch Parquet file inside `dir`.
    fn write_parquet(dir: &tempfile::TempDir, columns: Vec<(&str, ArrayRef)>) -> std::path::PathBuf {
        let schema = Arc::new(Schema::new(
            columns
                .iter()
                .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
                .collect::<Vec<_>>(),
        ));
        let batch =
            RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, a)| a).collect())
                .unwrap();

        let path = dir.path().join("transactions.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn text(values: &[&str]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    /// Three rows; the second has a negative age. `invoice_date` is supplied
    /// by the caller so both date encodings can be exercised.
    fn parquet_columns(invoice_date: ArrayRef) -> Vec<(&'static str, ArrayRef)> {
        vec![
            ("invoice_no", text(&["I1", "I2", "I3"])),
            ("customer_id", text(&["C1", "C2", "C3"])),
            ("gender", text(&["Female", "Male", "Male"])),
            ("age", Arc::new(Int64Array::from(vec![28, -4, 61]))),
            ("category", text(&["Clothing", "Shoes", "Toys"])),
            ("quantity", Arc::new(Int32Array::from(vec![5, 1, 2]))),
            ("price", Arc::new(Float64Array::from(vec![1500.4, 600.17, 71.68]))),
            ("payment_method", text(&["Credit Card", "Cash", "Debit Card"])),
            ("invoice_date", invoice_date),
            ("shopping_mall", text(&["Kanyon", "Kanyon", "Metrocity"])),
        ]
    }

    fn check_parquet_rows(ds: &TransactionDataset) {
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.skipped_rows, 1);
        assert_eq!(ds.malls, vec!["Kanyon", "Metrocity"]);

        let first = &ds.transactions[0];
        assert_eq!(first.invoice_no, "I1");
        assert_eq!(first.gender, Gender::Female);
        assert_eq!(first.age, 28);
        assert_eq!(first.category, "Clothing");
        assert_eq!(first.quantity, 5);
        assert_eq!(first.price, 1500.4);
        assert_eq!(first.payment_method, "Credit Card");
        assert_eq!(first.invoice_date, date(2022, 8, 5));

        let last = &ds.transactions[1];
        assert_eq!(last.invoice_no, "I3");
        assert_eq!(last.age, 61);
        assert_eq!(last.invoice_date, date(2023, 3, 8));
        assert_eq!(last.mall, "Metrocity");
    }

    #[test]
    fn parquet_with_text_dates_loads_and_skips_negative_age() {
        let dir = tempfile::tempdir().unwrap();
        let dates = text(&["05/08/2022", "01/01/2022", "08/03/2023"]);
        let path = write_parquet(&dir, parquet_columns(dates));
        check_parquet_rows(&load_file(&path).unwrap());
    }

    #[test]
    fn parquet_with_date32_dates_loads() {
        let epoch = date(1970, 1, 1);
        let days = |d: NaiveDate| (d - epoch).num_days() as i32;
        let dates: ArrayRef = Arc::new(Date32Array::from(vec![
            days(date(2022, 8, 5)),
            days(date(2022, 1, 1)),
            days(date(2023, 3, 8)),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(&dir, parquet_columns(dates));
        check_parquet_rows(&load_file(&path).unwrap());
    }

    #[test]
    fn parquet_missing_column_is_an_error() {
        let mut columns = parquet_columns(text(&["05/08/2022", "01/01/2022", "08/03/2023"]));
        columns.retain(|(name, _)| *name != "shopping_mall");

        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(&dir, columns);
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("shopping_mall"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("transactions.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
