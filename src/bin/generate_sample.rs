use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use flate2::write::GzEncoder;
use flate2::Compression;

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

    /// Uniform integer in `lo..=hi`.
    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn gz_tsv_writer(path: &Path) -> Result<csv::Writer<GzEncoder<File>>> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(GzEncoder::new(file, Compression::default())))
}

fn finish(wtr: csv::Writer<GzEncoder<File>>) -> Result<()> {
    let enc = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing table: {e}"))?;
    enc.finish().context("finishing gzip stream")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let categories = ["Music", "Gaming", "Education", "Comedy", "News & Politics"];
    // rough weekly view-growth scale per category
    let growth_scale = [60_000.0, 35_000.0, 8_000.0, 20_000.0, 45_000.0];
    let name_stems = [
        "Beats", "Plays", "Lab", "Lounge", "Daily", "Studio", "Corner", "Vault",
    ];

    let out_dir = Path::new("sample_data");
    std::fs::create_dir_all(out_dir).context("creating sample_data directory")?;

    let mut channels = gz_tsv_writer(&out_dir.join("df_channels_en.tsv.gz"))?;
    channels
        .write_record([
            "category_cc",
            "join_date",
            "channel_id",
            "name_cc",
            "subscribers_cc",
            "videos_cc",
        ])
        .context("writing channels header")?;

    let mut timeseries = gz_tsv_writer(&out_dir.join("df_timeseries_en.tsv.gz"))?;
    timeseries
        .write_record([
            "channel",
            "category",
            "datetime",
            "views",
            "delta_views",
            "subs",
            "delta_subs",
        ])
        .context("writing timeseries header")?;

    let start = NaiveDate::from_ymd_opt(2017, 1, 2).context("valid start date")?;
    let n_channels = 40;
    let n_weeks = 52;
    let mut n_observations = 0usize;

    for c in 0..n_channels {
        let cat_idx = (c as usize) % categories.len();
        let channel_id = format!("UCsample{c:014}");
        let name = format!(
            "{} {}",
            categories[cat_idx].split(' ').next().unwrap_or("Channel"),
            name_stems[rng.range(0, name_stems.len() as u64 - 1) as usize]
        );
        let subscribers = rng.range(5_000, 2_000_000);
        let videos = rng.range(10, 1_200);
        let join_year = rng.range(2006, 2016);

        // channel 0 exercises the null-category path
        let category = if c == 0 { "" } else { categories[cat_idx] };
        channels
            .write_record([
                category,
                &format!("{join_year}-06-15"),
                &channel_id,
                &name,
                &subscribers.to_string(),
                &videos.to_string(),
            ])
            .context("writing channel row")?;

        let mut views = rng.range(100_000, 50_000_000) as f64;
        let mut subs = subscribers as f64 * 0.8;
        let view_scale = growth_scale[cat_idx] * (0.3 + rng.next_f64() * 1.7);
        let sub_scale = view_scale / rng.gauss(90.0, 15.0).max(20.0);

        for week in 0..n_weeks {
            let date = start + Duration::weeks(week);
            // one deliberately unparseable timestamp per dataset
            let datetime = if c == 1 && week == 3 {
                "unknown".to_string()
            } else {
                format!("{} 00:00:00", date.format("%Y-%m-%d"))
            };

            let (delta_views, delta_subs) = if week == 0 {
                // no prior week, deltas unknown
                (String::new(), String::new())
            } else {
                let dv = rng.gauss(view_scale, view_scale * 0.4);
                let ds = rng.gauss(sub_scale, sub_scale * 0.5);
                views += dv;
                subs += ds;
                (format!("{dv:.1}"), format!("{ds:.1}"))
            };

            timeseries
                .write_record([
                    channel_id.as_str(),
                    category,
                    &datetime,
                    &format!("{views:.1}"),
                    &delta_views,
                    &format!("{subs:.1}"),
                    &delta_subs,
                ])
                .context("writing timeseries row")?;
            n_observations += 1;
        }
    }

    finish(channels)?;
    finish(timeseries)?;

    println!(
        "Wrote {n_channels} channels and {n_observations} observations to {}",
        out_dir.display()
    );
    Ok(())
}
