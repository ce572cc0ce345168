use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Receives connection lifecycle events for a single request.
///
/// Every mark is relative to the instant the request was started. Each mark is
/// recorded at most once; later calls for the same event are ignored.
pub trait TimingCollector: Send + Sync {
    fn mark_dns(&self);
    fn mark_connected(&self);
    fn mark_secure(&self);
    fn mark_first_byte(&self);
    fn mark_complete(&self);
}

/// Collects lifecycle marks for one probe request.
#[derive(Debug, Default)]
pub struct PhaseRecorder {
    start: OnceLock<Instant>,
    dns: OnceLock<Duration>,
    tcp: OnceLock<Duration>,
    tls: OnceLock<Duration>,
    first_byte: OnceLock<Duration>,
    complete: OnceLock<Duration>,
}

impl PhaseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the start instant. Marks fired before this are dropped.
    pub fn begin(&self) {
        let _ = self.start.set(Instant::now());
    }

    fn record(&self, slot: &OnceLock<Duration>) {
        if let Some(start) = self.start.get() {
            let _ = slot.set(start.elapsed());
        }
    }

    /// Builds the finished record. Fails if the request never completed.
    pub fn finish(&self, status: u16) -> Result<HttpPhaseTiming, anyhow::Error> {
        let total = self
            .complete
            .get()
            .copied()
            .ok_or(anyhow!("probe finished without a complete response"))?;
        Ok(HttpPhaseTiming {
            dns: self.dns.get().copied(),
            tcp: self.tcp.get().copied(),
            tls: self.tls.get().copied(),
            first_byte: self.first_byte.get().copied(),
            total,
            status,
        })
    }
}

impl TimingCollector for PhaseRecorder {
    fn mark_dns(&self) {
        self.record(&self.dns);
    }

    fn mark_connected(&self) {
        self.record(&self.tcp);
    }

    fn mark_secure(&self) {
        self.record(&self.tls);
    }

    fn mark_first_byte(&self) {
        self.record(&self.first_byte);
    }

    fn mark_complete(&self) {
        self.record(&self.complete);
    }
}

/// Lifecycle marks of one request, each relative to the request start.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpPhaseTiming {
    pub dns: Option<Duration>,
    pub tcp: Option<Duration>,
    pub tls: Option<Duration>,
    pub first_byte: Option<Duration>,
    pub total: Duration,
    pub status: u16,
}

pub(crate) fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn mark_ms(mark: Option<Duration>) -> Option<f64> {
    mark.map(as_millis_f64)
}

impl fmt::Display for HttpPhaseTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HTTP phase timing (fresh connection, status {}):", self.status)?;
        write_mark(f, "DNS resolved", mark_ms(self.dns))?;
        write_mark(f, "TCP connected", mark_ms(self.tcp))?;
        write_mark(f, "TLS ready", mark_ms(self.tls))?;
        write_mark(f, "TTFB", mark_ms(self.first_byte))?;
        write_mark(f, "Total", Some(as_millis_f64(self.total)))
    }
}

fn write_mark(f: &mut fmt::Formatter<'_>, label: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(ms) => writeln!(f, "  {:<16} {:>10.2} ms", format!("{label}:"), ms),
        None => writeln!(f, "  {:<16} {:>10}", format!("{label}:"), "N/A"),
    }
}

/// Phase durations derived from an [`HttpPhaseTiming`], in milliseconds.
///
/// A missing DNS mark counts as zero. Any other missing input leaves the
/// dependent value unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyBreakdown {
    pub dns_ms: f64,
    pub tcp_handshake_ms: Option<f64>,
    pub tls_handshake_ms: Option<f64>,
    pub network_setup_ms: Option<f64>,
    pub server_processing_ms: Option<f64>,
    pub rtt_estimate_ms: Option<f64>,
    pub ttfb_ms: Option<f64>,
    pub total_ms: f64,
}

impl LatencyBreakdown {
    pub fn from_timing(timing: &HttpPhaseTiming) -> Self {
        let dns_ms = mark_ms(timing.dns).unwrap_or(0.0);
        let tcp_mark = mark_ms(timing.tcp);
        let tls_mark = mark_ms(timing.tls);
        let ttfb_ms = mark_ms(timing.first_byte);

        let tcp_handshake_ms = tcp_mark.map(|tcp| tcp - dns_ms);
        let tls_handshake_ms = match (tls_mark, tcp_mark) {
            (Some(tls), Some(tcp)) => Some(tls - tcp),
            _ => None,
        };
        // Plain http has no TLS mark; setup then ends at the TCP connect.
        let network_setup_ms = tls_mark.or(tcp_mark);
        let server_processing_ms = match (ttfb_ms, network_setup_ms) {
            (Some(ttfb), Some(setup)) => Some(ttfb - setup),
            _ => None,
        };

        Self {
            dns_ms,
            tcp_handshake_ms,
            tls_handshake_ms,
            network_setup_ms,
            server_processing_ms,
            rtt_estimate_ms: tcp_handshake_ms,
            ttfb_ms,
            total_ms: as_millis_f64(timing.total),
        }
    }
}

/// Share of `total` taken by `part`, as a rounded percentage.
pub fn pct_of(part: f64, total: f64) -> String {
    if total == 0.0 {
        return "—".to_string();
    }
    format!("{}%", (100.0 * part / total).round() as i64)
}

impl fmt::Display for LatencyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latency breakdown:")?;
        let ttfb = self.ttfb_ms;
        let share = |part: Option<f64>| match (part, ttfb) {
            (Some(p), Some(t)) => pct_of(p, t),
            _ => "—".to_string(),
        };
        let rows = [
            ("DNS lookup", Some(self.dns_ms)),
            ("TCP handshake", self.tcp_handshake_ms),
            ("TLS handshake", self.tls_handshake_ms),
            ("Network setup", self.network_setup_ms),
            ("Server/API time", self.server_processing_ms),
        ];
        for (label, value) in rows {
            match value {
                Some(ms) => writeln!(
                    f,
                    "  {:<16} {:>10.2} ms  ({} of TTFB)",
                    format!("{label}:"),
                    ms,
                    share(value)
                )?,
                None => writeln!(f, "  {:<16} {:>10}", format!("{label}:"), "N/A")?,
            }
        }
        write_mark(f, "Est. RTT", self.rtt_estimate_ms)?;
        write_mark(f, "TTFB", self.ttfb_ms)?;
        write_mark(f, "Total", Some(self.total_ms))
    }
}
