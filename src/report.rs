//! Canal de avisos hacia el framework anfitrión. Los fallos no fatales
//! (lotes que no se pudieron descargar, registros omitidos, imágenes fallidas)
//! se notifican aquí además de quedar en el log.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
}

pub trait Reporter: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Reporter que registra en `tracing` y conserva los avisos para la API.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<Report>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, severity: Severity, message: &str) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Report {
                severity,
                message: message.to_string(),
            });
    }
}

impl Reporter for CollectingReporter {
    fn warn(&self, message: &str) {
        warn!("{message}");
        self.push(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        error!("{message}");
        self.push(Severity::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_are_kept_in_order() {
        let reporter = CollectingReporter::new();
        reporter.warn("registro omitido");
        reporter.error("lote fallido");

        let reports = reporter.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].severity, Severity::Warning);
        assert_eq!(reports[1].message, "lote fallido");

        reporter.clear();
        assert!(reporter.reports().is_empty());
    }
}
