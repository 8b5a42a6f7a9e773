use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Language the pipeline runs in. Selects prompt texts, artifact file
/// names, chart labels, and the email subject. One workflow, two text sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
}

impl Locale {
    pub fn report_file_name(&self) -> &'static str {
        match self {
            Locale::En => "sensor_report.md",
            Locale::Es => "informe_sensores.md",
        }
    }

    pub fn humidity_table_file_name(&self) -> &'static str {
        match self {
            Locale::En => "estimated_humidity.md",
            Locale::Es => "humedad_estimado.md",
        }
    }

    pub fn chart_file_name(&self) -> &'static str {
        match self {
            Locale::En => "soil_humidity.png",
            Locale::Es => "humedad_suelo.png",
        }
    }

    /// Column headers the report stage asks the oracle to use, in order:
    /// date, minimum, average, maximum.
    pub fn report_columns(&self) -> [&'static str; 4] {
        match self {
            Locale::En => ["date", "min_value", "avg_value", "max_value"],
            Locale::Es => ["fecha", "valor_minimo", "valor_promedio", "valor_maximo"],
        }
    }

    /// Column headers of the humidity table written by the chart stage.
    pub fn humidity_columns(&self) -> [&'static str; 4] {
        match self {
            Locale::En => ["date", "humidity_min", "humidity_avg", "humidity_max"],
            Locale::Es => [
                "fecha",
                "humedad_minima",
                "humedad_promedio",
                "humedad_maxima",
            ],
        }
    }

    pub fn chart_title(&self) -> &'static str {
        match self {
            Locale::En => "Soil Humidity by Day",
            Locale::Es => "Humedad del Suelo por Día",
        }
    }

    pub fn chart_x_label(&self) -> &'static str {
        match self {
            Locale::En => "Date",
            Locale::Es => "Fecha",
        }
    }

    pub fn chart_y_label(&self) -> &'static str {
        match self {
            Locale::En => "Humidity Percentage (%)",
            Locale::Es => "Porcentaje de Humedad (%)",
        }
    }

    pub fn chart_band_legend(&self) -> &'static str {
        match self {
            Locale::En => "Min/Max Range",
            Locale::Es => "Rango Min/Max",
        }
    }

    pub fn chart_avg_legend(&self) -> &'static str {
        match self {
            Locale::En => "Average Humidity",
            Locale::Es => "Humedad Promedio",
        }
    }

    /// Email subject line; `date` is already formatted as dd/mm/yyyy.
    pub fn email_subject(&self, date: &str) -> String {
        match self {
            Locale::En => format!("Humidity Report {date}"),
            Locale::Es => format!("Reporte humedad {date}"),
        }
    }
}

/// The fixed, workflow-relative artifact paths for one pipeline run.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub report: PathBuf,
    pub humidity_table: PathBuf,
    pub chart: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, locale: Locale) -> Self {
        Self {
            report: output_dir.join(locale.report_file_name()),
            humidity_table: output_dir.join(locale.humidity_table_file_name()),
            chart: output_dir.join(locale.chart_file_name()),
        }
    }

    /// The chart-stage artifacts, checked by that stage's success predicate
    /// and removed by end-of-run cleanup.
    pub fn chart_stage_files(&self) -> [&Path; 2] {
        [self.chart.as_path(), self.humidity_table.as_path()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names_per_locale() {
        let en = ArtifactPaths::new(Path::new("/out"), Locale::En);
        assert_eq!(en.report, Path::new("/out/sensor_report.md"));
        assert_eq!(en.chart, Path::new("/out/soil_humidity.png"));
        assert_eq!(en.humidity_table, Path::new("/out/estimated_humidity.md"));

        let es = ArtifactPaths::new(Path::new("/out"), Locale::Es);
        assert_eq!(es.report, Path::new("/out/informe_sensores.md"));
        assert_eq!(es.chart, Path::new("/out/humedad_suelo.png"));
        assert_eq!(es.humidity_table, Path::new("/out/humedad_estimado.md"));
    }

    #[test]
    fn test_locale_deserializes_lowercase() {
        let locale: Locale = serde_json::from_str("\"es\"").unwrap();
        assert_eq!(locale, Locale::Es);
        let locale: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(locale, Locale::En);
    }

    #[test]
    fn test_email_subject() {
        assert_eq!(
            Locale::En.email_subject("05/08/2026"),
            "Humidity Report 05/08/2026"
        );
        assert_eq!(
            Locale::Es.email_subject("05/08/2026"),
            "Reporte humedad 05/08/2026"
        );
    }
}
