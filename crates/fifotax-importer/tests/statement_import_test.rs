//! Broker statements imported from disk and run through the engine.

use fifotax_core::YearMonth;
use fifotax_engine::{Engine, RunStatus, TransactionSource};
use fifotax_importer::{CsvSource, ImporterConfig};
use fifotax_rates::{ExchangeRateTable, InflationIndexTable};
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

const STATEMENT: &str = "\
Tarih,İşlem Türü,Sembol,İşlem Tipi,İşlem Durumu,Para Birimi,Gerçekleşen Adet,Ortalama İşlem Fiyatı,İşlem Ücreti
10/01/23 10:15:00,Hisse,THYAO,Alış,Gerçekleşti,TRY,100,100,\"1,20\"
03/06/24 11:00:00,Hisse,THYAO,Satış,Gerçekleşti,TRY,100,300,\"1,20\"
";

const DIVIDENDS: &str = "\
Ödeme Tarihi,Sermaya Piyasası Aracı,Brüt Temettü Tutarı,Stopaj*,Net Temettü Tutarı
15/05/24,THYAO,500,50,450
";

fn write(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn index() -> InflationIndexTable {
    [
        (YearMonth::new(2022, 12).unwrap(), dec!(2021.19)),
        (YearMonth::new(2024, 4).unwrap(), dec!(3369.98)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_statement_rows_keep_their_file_lines() {
    let tx = write(STATEMENT);
    let source = CsvSource::new(ImporterConfig::broker_statement(), tx.path());
    let records = source.transactions("me").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_row, Some(2));
    assert_eq!(records[1].side, "Satış");
    assert_eq!(records[1].fee.as_deref(), Some("1.20"));
}

#[test]
fn test_statement_end_to_end() {
    let tx = write(STATEMENT);
    let div = write(DIVIDENDS);
    let source =
        CsvSource::new(ImporterConfig::broker_statement(), tx.path()).with_dividends(div.path());

    let engine = Engine::new(ExchangeRateTable::new(), index());
    let run = engine.run_for_user("me", &source, None).unwrap();

    assert_eq!(run.status, RunStatus::Complete, "{:?}", run.warnings);
    let report = &run.report;
    assert_eq!(report.events.len(), 1);

    let event = &report.events[0];
    assert!(event.inflation_applied);
    assert_eq!(event.proceeds, dec!(30000));
    // 10000 scaled by 3369.98 / 2021.19
    assert!(event.cost_basis > dec!(16673) && event.cost_basis < dec!(16674));
    assert_eq!(event.profit, event.proceeds - event.cost_basis);

    assert_eq!(report.total_commission, dec!(2.40));
    assert_eq!(report.dividends.gross, dec!(500));
    assert_eq!(report.dividends.withheld, dec!(50));
    assert_eq!(
        report.total_taxable_income,
        report.net_after_commission + dec!(500)
    );
    assert!(report.open_lots.is_empty());
}

#[test]
fn test_bad_rows_surface_as_engine_warnings() {
    let tx = write(
        "symbol,side,quantity,price,currency,executed_at\n\
         THYAO,buy,10,250,TRY,2024-01-02\n\
         THYAO,buy,ten,250,TRY,2024-01-03\n\
         THYAO,sell,10,260,TRY,2024-01-04\n",
    );
    let source = CsvSource::new(ImporterConfig::default(), tx.path());
    let engine = Engine::new(ExchangeRateTable::new(), InflationIndexTable::new());
    let run = engine.run_for_user("me", &source, None).unwrap();

    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.warnings.len(), 1);
    assert!(run.warnings[0].to_string().starts_with("row 3: "));
    assert_eq!(run.report.net_profit_loss, dec!(100));
}

#[test]
fn test_statement_thousands_are_not_decimals() {
    let tx = write(
        "Tarih;İşlem Türü;Sembol;İşlem Tipi;İşlem Durumu;Para Birimi;Gerçekleşen Adet;Ortalama İşlem Fiyatı;İşlem Ücreti\n\
         10/01/23 10:15:00;Hisse;EREGL;Alış;Gerçekleşti;TRY;1.250;1.234,56;1.234,56 TL\n\
         03/06/24 11:00:00;Hisse;EREGL;Satış;Gerçekleşti;TRY;1.250;1.300,00;0,00\n",
    );
    let mut config = ImporterConfig::broker_statement();
    config.csv.delimiter = ';';
    let source = CsvSource::new(config, tx.path());

    let engine = Engine::new(ExchangeRateTable::new(), index());
    let run = engine.run_for_user("me", &source, None).unwrap();

    assert_eq!(run.status, RunStatus::Complete, "{:?}", run.warnings);
    let event = &run.report.events[0];
    assert_eq!(event.matched_quantity, dec!(1250));
    assert_eq!(event.proceeds, dec!(1625000));
    assert_eq!(run.report.total_commission, dec!(1234.56));
}
