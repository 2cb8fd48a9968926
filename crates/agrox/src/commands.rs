use agro_adapter::{
    CropRecommendation, DiseaseDetection, FertilizerRecommendation, HttpAdapter, ImageFile, Submit,
    YieldPrediction,
};
use agro_forms::{catalog, CropPage, DiseasePage, FertilizerPage, Form, Outcome, Page, YieldPage};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct Client {
    adapter: Arc<HttpAdapter>,
    json: bool,
}

impl Client {
    /// Client for `api`, or for `AGRO_API_URL` / the local default when absent.
    pub fn new(api: Option<&str>, json: bool) -> Self {
        let adapter = match api {
            Some(raw) => HttpAdapter::new(&agro_config::resolve_base_url(Some(raw))),
            None => HttpAdapter::from_env(),
        };
        Self { adapter: Arc::new(adapter), json }
    }

    fn submitter(&self) -> Arc<dyn Submit> {
        self.adapter.clone()
    }

    fn emit<T: Serialize>(&self, value: &T, report: impl FnOnce(&T)) -> Result<(), String> {
        if self.json {
            let text = serde_json::to_string_pretty(value).map_err(|e| format!("encode JSON: {e}"))?;
            println!("{text}");
        } else {
            report(value);
        }
        Ok(())
    }
}

type Fields<'a> = [(&'a str, Option<String>)];

fn fill<F: Form>(page: &Page<F>, fields: &Fields<'_>) -> Result<(), String> {
    for (name, value) in fields {
        if let Some(v) = value {
            page.set(name, v).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Run one submission to completion.
async fn run<F: Form>(page: &Page<F>) -> Result<F::Response, String> {
    debug!(route = F::ENDPOINT.path(), "submitting form");
    match page.submit().await {
        Ok(Outcome::Success(r)) => Ok(r),
        Ok(Outcome::Failure(message)) => Err(message),
        Err(_busy) => Err("submission already in flight".to_string()),
    }
}

// ── crop ────────────────────────────────────────────────────────

pub async fn crop(client: &Client, fields: &Fields<'_>) -> Result<(), String> {
    let page = CropPage::new(client.submitter());
    fill(&page, fields)?;
    let r = run(&page).await?;
    client.emit(&r, print_crop)
}

fn print_crop(r: &CropRecommendation) {
    println!(
        "{} {}",
        "Recommended crop:".dimmed(),
        r.prediction.as_deref().unwrap_or("?").green().bold()
    );
    if let Some(ref m) = r.message {
        println!("  {m}");
    }
    if let Some(ref c) = r.confidence {
        println!("{} {}", "Confidence:      ".dimmed(), c.cyan());
    }
}

// ── fertilizer ──────────────────────────────────────────────────

pub async fn fertilizer(client: &Client, fields: &Fields<'_>) -> Result<(), String> {
    let page = FertilizerPage::new(client.submitter());
    fill(&page, fields)?;
    let r = run(&page).await?;
    client.emit(&r, print_fertilizer)
}

fn print_fertilizer(r: &FertilizerRecommendation) {
    if let Some(ref crop) = r.crop {
        println!("{} {}", "Recommendation for".dimmed(), crop.green().bold());
    }
    if let Some(ref text) = r.recommendation {
        println!("  {text}");
    }
    if let Some(ref d) = r.primary_deficiency {
        println!("{} {}", "Primary deficiency:".dimmed(), d.yellow().bold());
    }
    let Some(ref analysis) = r.nutrient_analysis else {
        return;
    };
    println!(
        "  {:<3} {:>10} {:>10} {:>10}",
        "".dimmed(),
        "required".dimmed(),
        "current".dimmed(),
        "diff".dimmed()
    );
    for (nutrient, required, current, diff) in analysis.rows() {
        let diff_text = diff.map(signed).unwrap_or_else(|| "-".into());
        let diff_text = match diff {
            Some(d) if d > 0.0 => diff_text.yellow(),
            Some(d) if d < 0.0 => diff_text.red(),
            _ => diff_text.green(),
        };
        println!(
            "  {:<3} {:>10} {:>10} {:>10}",
            nutrient.bold(),
            opt(required),
            opt(current),
            diff_text
        );
    }
}

// ── disease ─────────────────────────────────────────────────────

pub async fn disease(client: &Client, path: &Path) -> Result<(), String> {
    let image = ImageFile::from_path(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    if !client.json {
        println!(
            "{} {} {}",
            "Image:    ".dimmed(),
            image.file_name,
            format!("({:.2} MB)", image.size_mb()).dimmed()
        );
    }
    let page = DiseasePage::new(client.submitter());
    if !page.select_image(image) {
        return Err(format!("not an image: {}", path.display()));
    }
    let r = run(&page).await?;
    client.emit(&r, print_disease)
}

fn print_disease(r: &DiseaseDetection) {
    println!("{} {}", "Diagnosis:".dimmed(), r.display_name().green().bold());
    if let Some(ref label) = r.prediction {
        println!("{} {}", "Class:    ".dimmed(), label);
    }
    if let (Some(i), Some(n)) = (r.class_index, r.total_classes) {
        println!("{} {} of {}", "Index:    ".dimmed(), i, n);
    }
    match (&r.cause, &r.cure) {
        (None, None) => {
            if let Some(ref label) = r.prediction {
                println!("  Disease detected: {label}");
            }
        }
        (cause, cure) => {
            if let Some(c) = cause {
                println!("{}\n  {}", "Cause:".yellow().bold(), c);
            }
            if let Some(c) = cure {
                println!("{}\n  {}", "Treatment:".cyan().bold(), c);
            }
        }
    }
}

// ── yield ───────────────────────────────────────────────────────

pub async fn yield_prediction(client: &Client, fields: &Fields<'_>) -> Result<(), String> {
    let page = YieldPage::new(client.submitter());
    fill(&page, fields)?;
    let r = run(&page).await?;
    client.emit(&r, print_yield)
}

fn print_yield(r: &YieldPrediction) {
    let amount = r.prediction.map(grouped).unwrap_or_else(|| "?".into());
    println!(
        "{} {} {}",
        "Predicted yield:".dimmed(),
        amount.green().bold(),
        r.unit.as_deref().unwrap_or("")
    );
    let Some(ref f) = r.input_features else {
        return;
    };
    if let Some(ref item) = f.item {
        println!("{} {}", "  Crop:       ".dimmed(), item);
    }
    if let Some(year) = f.year {
        println!("{} {}", "  Year:       ".dimmed(), year);
    }
    if let Some(ref area) = f.area {
        println!("{} {}", "  Area:       ".dimmed(), area);
    }
    if let Some(v) = f.rainfall {
        println!("{} {} mm", "  Rainfall:   ".dimmed(), v);
    }
    if let Some(v) = f.avg_temperature {
        println!("{} {}°C", "  Temperature:".dimmed(), v);
    }
    if let Some(v) = f.pesticides {
        println!("{} {} tonnes", "  Pesticides: ".dimmed(), v);
    }
}

// ── catalog and status ─────────────────────────────────────────

pub fn crops() -> Result<(), String> {
    for crop in catalog::CROPS {
        println!("{crop}");
    }
    Ok(())
}

pub async fn health(client: &Client) -> Result<(), String> {
    let h = client.adapter.health().await.map_err(|e| e.to_string())?;
    client.emit(&h, |h| {
        let status = h.status.as_deref().unwrap_or("unknown");
        if h.is_healthy() {
            println!("{} {}", "✓".green().bold(), status.green());
        } else {
            println!("{} {}", "✗".red().bold(), status.red());
        }
        for (model, loaded) in &h.models {
            let mark = if *loaded { "loaded".green() } else { "missing".red() };
            println!("  {:<24} {}", model, mark);
        }
    })
}

pub async fn info(client: &Client) -> Result<(), String> {
    let i = client.adapter.service_info().await.map_err(|e| e.to_string())?;
    client.emit(&i, |i| {
        println!(
            "{} {}",
            i.message.as_deref().unwrap_or("?").bold(),
            i.version.as_deref().unwrap_or("").dimmed()
        );
        println!("{} {}", "URL:".dimmed(), client.adapter.base_url().cyan());
        for (route, about) in &i.endpoints {
            println!("  {:<20} {}", route.cyan(), about);
        }
    })
}

// ── formatting ──────────────────────────────────────────────────

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".into())
}

fn signed(v: f64) -> String {
    if v > 0.0 {
        format!("+{v}")
    } else {
        v.to_string()
    }
}

/// Thousands separators, at most three decimals: `36613.456789` → `36,613.457`.
fn grouped(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::new();
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}
