//! Periodic, human-readable progress output for a campaign. No external logging crate is used;
//! progress lines are timer-gated `println!`s, following the project's existing convention.

use std::time::{Duration, Instant};

use num_format::ToFormattedString;

use crate::aggregator::Aggregator;
use crate::config::user_locale;

static REPORT_PROGRESS_STANDARD: ReportProgressStandard = ReportProgressStandard;

/// Tracks time and reports campaign progress after a while.
pub struct Reporter<'a> {
    last_progress_time: Instant,
    report_progress_after: Duration,
    last_detail_time: Instant,
    report_detail_after: Duration,
    report_progress: &'a (dyn ReportProgress + 'a),
    progress_info: ProgressInfo,
}

impl<'a> Reporter<'a> {
    pub fn new_default(total: u128) -> Self {
        Self {
            last_progress_time: Instant::now(),
            report_progress_after: Duration::new(2, 0),
            last_detail_time: Instant::now(),
            report_detail_after: Duration::new(30, 0),
            report_progress: &REPORT_PROGRESS_STANDARD,
            progress_info: ProgressInfo::new(total),
        }
    }

    pub fn builder(total: u128) -> ReporterBuilder {
        ReporterBuilder::new(total)
    }

    /// Reports progress; should be called when [`Self::is_due_progress`] returns true.
    pub fn report(&mut self, processed: u128) -> String {
        self.progress_info.add_progress(processed);
        let s = self
            .report_progress
            .report_progress(processed, &self.progress_info);
        self.reset_last_report_progress_time();
        s
    }

    /// Reports progress with an [`Aggregator`] summary; should be called when
    /// [`Self::is_due_progress`] returns true.
    pub fn report_with_aggregator(&mut self, aggregator: &Aggregator) -> String {
        let processed = aggregator.total_processed_raw() as u128;
        self.progress_info.add_progress(processed);
        let mut s = String::new();
        if self.is_due_detail() {
            s.push_str(&self.report_progress.report_detail(aggregator));
            self.reset_last_report_detail_time();
        }
        s.push_str(&self.report_progress.report_progress(processed, &self.progress_info));
        self.reset_last_report_progress_time();
        s
    }

    pub fn reset_last_report_progress_time(&mut self) {
        self.last_progress_time = Instant::now();
    }

    pub fn reset_last_report_detail_time(&mut self) {
        self.last_detail_time = Instant::now();
    }

    pub fn is_due_progress(&self) -> bool {
        self.last_progress_time.elapsed() > self.report_progress_after
    }

    pub fn is_due_detail(&self) -> bool {
        self.last_detail_time.elapsed() > self.report_detail_after
    }
}

pub trait ReportProgress {
    fn report_progress(&self, processed: u128, progress_info: &ProgressInfo) -> String;
    fn report_detail(&self, aggregator: &Aggregator) -> String;
}

#[derive(Default)]
pub struct ReportProgressStandard;

impl ReportProgressStandard {
    pub fn remaining_estimate_for_minutes(
        &self,
        minutes: usize,
        progress_info: &ProgressInfo,
    ) -> Option<Duration> {
        let average = progress_info.progress_average_per_sec(minutes as u64 * 60)?;
        let processed = progress_info.progress_data.last()?.processed;
        Some(Duration::from_secs_f64(
            (progress_info.total - processed) as f64 / average,
        ))
    }
}

impl ReportProgress for ReportProgressStandard {
    fn report_detail(&self, aggregator: &Aggregator) -> String {
        format!(
            "\nprocessed {}, halting {}, non_halting_reasons: {:?}",
            aggregator.total_processed_raw(),
            aggregator.total_halting_raw(),
            aggregator.non_halting_reasons()
        )
    }

    fn report_progress(&self, processed: u128, progress_info: &ProgressInfo) -> String {
        let locale = user_locale();
        let percent = if progress_info.total > 0 {
            (processed as f64 / progress_info.total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        let dur_total = progress_info.start_time.elapsed();
        let p_per_sec = processed as f64 / dur_total.as_secs_f64();
        let remaining_est_total = if p_per_sec > 0.0 {
            Duration::from_secs_f64((progress_info.total.saturating_sub(processed)) as f64 / p_per_sec)
        } else {
            Duration::ZERO
        };
        format!(
            "Working: {} / {} ({percent:.1}%), remaining {}, runtime {}",
            processed.to_formatted_string(&locale),
            progress_info.total.to_formatted_string(&locale),
            format_duration_hhmmss_ms(remaining_est_total, false),
            format_duration_hhmmss_ms(dur_total, false)
        )
    }
}

#[derive(Debug)]
struct ProgressTimeStamp {
    time_stamp: Instant,
    processed: u128,
}

#[derive(Debug)]
pub struct ProgressInfo {
    start_time: Instant,
    total: u128,
    progress_data: Vec<ProgressTimeStamp>,
    max_duration_s: u64,
}

impl ProgressInfo {
    pub fn new(total: u128) -> Self {
        Self {
            start_time: Instant::now(),
            total,
            progress_data: Vec::new(),
            max_duration_s: 600,
        }
    }

    pub fn add_progress(&mut self, processed: u128) {
        self.progress_data.push(ProgressTimeStamp {
            time_stamp: Instant::now(),
            processed,
        });
        if self.progress_data.len() % 50 == 0 {
            self.clean_progress();
        }
    }

    fn clean_progress(&mut self) {
        let reference = Instant::now() - Duration::from_secs(self.max_duration_s);
        for (i, p) in self.progress_data.iter().enumerate() {
            if p.time_stamp >= reference {
                self.progress_data.drain(0..i);
                break;
            }
        }
    }

    pub fn progress_average_per_sec(&self, last_secs: u64) -> Option<f64> {
        let start_ref = Instant::now().checked_sub(Duration::from_secs(last_secs))?;
        for (i, p) in self.progress_data.iter().enumerate() {
            if p.time_stamp >= start_ref {
                if i == 0 {
                    break;
                }
                let p = &self.progress_data[i - 1];
                let last = self.progress_data.last().unwrap();
                let dur = last.time_stamp - p.time_stamp;
                return Some((last.processed - p.processed) as f64 / dur.as_secs_f64());
            }
        }
        None
    }
}

pub struct ReporterBuilder {
    total: u128,
}

impl ReporterBuilder {
    pub fn new(total: u128) -> Self {
        Self { total }
    }

    pub fn build(self) -> Reporter<'static> {
        Reporter {
            last_progress_time: Instant::now(),
            report_progress_after: Duration::new(2, 0),
            last_detail_time: Instant::now(),
            report_detail_after: Duration::new(30, 0),
            report_progress: &REPORT_PROGRESS_STANDARD,
            progress_info: ProgressInfo::new(self.total),
        }
    }
}

/// Formats a `std::time::Duration` into `HH:mm:ss[.ms]`.
pub fn format_duration_hhmmss_ms(duration: Duration, display_millis: bool) -> String {
    let total_milliseconds = duration.as_millis();
    let hours = total_milliseconds / (1000 * 60 * 60);
    let minutes = (total_milliseconds % (1000 * 60 * 60)) / (1000 * 60);
    let mut seconds = ((total_milliseconds % (1000 * 60 * 60)) % (1000 * 60)) / 1000;
    let milliseconds = total_milliseconds % 1000;
    if milliseconds >= 500 {
        seconds += 1;
    }

    if display_millis {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}
