use aqi_processor::models::{AirQualityRecord, AirQualityRecordBuilder};
use aqi_processor::processors::{classify, Aggregator, AqiImputer};
use aqi_processor::readers::CpcbReader;
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const CITIES: [&str; 5] = ["Delhi", "Mumbai", "Chennai", "Kolkata", "Lucknow"];

// Synthetic daily records, roughly a third with only one particulate
fn create_test_records(days: usize) -> Vec<AirQualityRecord> {
    let base_date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let mut records = Vec::with_capacity(days * CITIES.len());

    for day in 0..days {
        let date = base_date + chrono::Duration::days(day as i64);
        for (i, city) in CITIES.iter().enumerate() {
            let pm25 = 10.0 + ((day * 7 + i * 13) % 350) as f64;
            let pm10 = 20.0 + ((day * 11 + i * 17) % 480) as f64;
            let (pm25, pm10) = match (day + i) % 3 {
                0 => (Some(pm25), None),
                1 => (None, Some(pm10)),
                _ => (Some(pm25), Some(pm10)),
            };

            records.push(
                AirQualityRecordBuilder::new()
                    .city(*city)
                    .date(date)
                    .particulates(pm25, pm10)
                    .build()
                    .unwrap(),
            );
        }
    }

    records
}

fn create_test_csv(days: usize) -> Vec<u8> {
    let mut csv = String::from(
        "City,Date,PM2.5,PM10,NO,NO2,NOx,NH3,CO,SO2,O3,Benzene,Toluene,Xylene,AQI,AQI_Bucket\n",
    );
    for record in create_test_records(days) {
        let value = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},,,,,,,,,,,,\n",
            record.city,
            record.date.format("%Y-%m-%d"),
            value(record.pm25),
            value(record.pm10)
        ));
    }
    csv.into_bytes()
}

fn benchmark_imputation(c: &mut Criterion) {
    let records = create_test_records(365);
    let imputer = AqiImputer::new();

    c.bench_function("impute_single_year", |b| {
        b.iter(|| {
            let mut batch = records.clone();
            let mut imputed = 0;
            for record in batch.iter_mut() {
                if imputer.impute(record).is_ok() {
                    imputed += 1;
                }
            }
            black_box(imputed)
        })
    });
}

fn benchmark_classification(c: &mut Criterion) {
    let values: Vec<f64> = (0..=500).map(|v| v as f64).collect();

    c.bench_function("classify_full_range", |b| {
        b.iter(|| {
            let classified = values.iter().filter(|v| classify(**v).is_ok()).count();
            black_box(classified)
        })
    });
}

fn benchmark_csv_loading(c: &mut Criterion) {
    let bytes = create_test_csv(365);
    let reader = CpcbReader::new();

    c.bench_function("load_cpcb_csv", |b| {
        b.iter(|| {
            let (records, _) = reader.read_bytes(black_box(&bytes)).unwrap();
            black_box(records.len())
        })
    });
}

fn benchmark_summarize_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize_by_days");

    for &days in &[30, 365, 1825] {
        let records = create_test_records(days);

        group.bench_with_input(BenchmarkId::new("parallel", days), &records, |b, records| {
            b.iter(|| {
                let mut batch = records.clone();
                let summaries = Aggregator::new().summarize(&mut batch).unwrap();
                black_box(summaries.total_records())
            })
        });

        group.bench_with_input(BenchmarkId::new("sequential", days), &records, |b, records| {
            b.iter(|| {
                let mut batch = records.clone();
                let summaries = Aggregator::new()
                    .with_parallel(false)
                    .summarize(&mut batch)
                    .unwrap();
                black_box(summaries.total_records())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_imputation,
    benchmark_classification,
    benchmark_csv_loading,
    benchmark_summarize_by_size
);
criterion_main!(benches);
