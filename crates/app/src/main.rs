use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use gradecheck_core::record::DocumentMetadata;
use gradecheck_core::CanonicalGrade;
use gradecheck_ocr::{
    write_atomic, DocumentKind, DocumentPipeline, MockRecognizer, OcrBackend, PipelineError,
    ProcessedDocument,
};
use gradecheck_verify::{check_tamper, parse_grade_block, render_grade_block, verify_metadata};

mod report;

use report::{ScanReport, VerificationReport};

#[derive(Debug, Error)]
enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "gradecheck", about = "Extract and cross-check academic grade documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a Certificate of Enrollment scan
    Coe(ScanArgs),
    /// Process a Certificate of Grades scan
    Cog(ScanArgs),
    /// Cross-check grade sequences (and optionally metadata) from two sources
    Verify(VerifyArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Scanned document image, or already-recognized text with --raw-text
    input: PathBuf,
    /// Treat the input file as raw OCR text instead of an image
    #[arg(long)]
    raw_text: bool,
    /// Directory for result files
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
    /// Root of the content-addressed document store
    #[arg(long, default_value = "documents")]
    documents_dir: PathBuf,
    /// Print the JSON report instead of the text summary
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct VerifyArgs {
    /// Grade sequence file extracted from the printed document
    document: PathBuf,
    /// Grade sequence file from the registrar's reference page
    reference: PathBuf,
    /// Metadata JSON from the enrollment document
    #[arg(long)]
    coe_metadata: Option<PathBuf>,
    /// Metadata JSON from the grades document
    #[arg(long)]
    cog_metadata: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Coe(args) => run_scan(DocumentKind::Coe, args).await,
        Command::Cog(args) => run_scan(DocumentKind::Cog, args).await,
        Command::Verify(args) => run_verify(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// When built without the `tesseract` feature, image inputs are rejected at
/// recognition time; --raw-text inputs still work.
#[cfg(not(feature = "tesseract"))]
struct UnavailableRecognizer;

#[cfg(not(feature = "tesseract"))]
impl OcrBackend for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, gradecheck_ocr::OcrError> {
        Err(gradecheck_ocr::OcrError::NotAvailable)
    }
}

async fn build_recognizer(args: &ScanArgs) -> Result<Box<dyn OcrBackend>, AppError> {
    if args.raw_text {
        let text = tokio::fs::read_to_string(&args.input).await?;
        return Ok(Box::new(MockRecognizer::new(text)));
    }
    #[cfg(feature = "tesseract")]
    let backend: Box<dyn OcrBackend> = {
        use gradecheck_ocr::recognizer::tesseract_backend::TesseractRecognizer;
        Box::new(TesseractRecognizer::new(None, "eng"))
    };
    #[cfg(not(feature = "tesseract"))]
    let backend: Box<dyn OcrBackend> = Box::new(UnavailableRecognizer);
    Ok(backend)
}

async fn run_scan(kind: DocumentKind, args: ScanArgs) -> Result<(), AppError> {
    let recognizer = build_recognizer(&args).await?;
    let pipeline = DocumentPipeline::new(recognizer, args.documents_dir.clone());
    let result = pipeline.process_file(&args.input, kind).await?;

    write_results(kind, &args.results_dir, &result).await?;

    let grades = grade_sequence(&result);
    let (records, skips, excluded_codes, agg) = match &result.table {
        Some(t) => (
            t.records.clone(),
            t.skips.clone(),
            t.excluded_codes.clone(),
            Some(gradecheck_core::aggregate_weighted_grades(t)),
        ),
        None => (Vec::new(), Vec::new(), Default::default(), None),
    };

    if args.json {
        let scan = ScanReport {
            hash: result.hash_hex.clone(),
            program: gradecheck_core::split_program(&result.metadata.program_raw),
            metadata: result.metadata.clone(),
            metadata_issues: result.metadata_issues.clone(),
            records,
            skips,
            excluded_codes,
            grades,
            total_units: agg.as_ref().map_or(0, |a| a.total_units),
            weighted_average: agg.as_ref().and_then(|a| a.weighted_average),
        };
        println!("{}", serde_json::to_string_pretty(&scan)?);
    } else {
        print!(
            "{}",
            report::render_document_summary(&result.metadata, &records, &skips)
        );
        if let Some(agg) = &agg {
            println!("{}", report::render_grade_with_units(agg));
        }
    }
    Ok(())
}

/// Grade sequence in table order, in the shape the verifier compares.
fn grade_sequence(result: &ProcessedDocument) -> Vec<CanonicalGrade> {
    result
        .table
        .iter()
        .flat_map(|t| t.records.iter().filter_map(|r| r.grade))
        .collect()
}

async fn write_results(
    kind: DocumentKind,
    results_dir: &Path,
    result: &ProcessedDocument,
) -> Result<(), AppError> {
    let (tag, raw_name, meta_name) = match kind {
        DocumentKind::Coe => ("coe", "raw_coe_text.txt", "coe_metadata.json"),
        DocumentKind::Cog => ("cog", "raw_cog_text.txt", "cog_metadata.json"),
    };

    write_atomic(&results_dir.join(raw_name), result.ocr_text.as_bytes()).await?;

    let meta_json = serde_json::to_string_pretty(&result.metadata)?;
    write_atomic(&results_dir.join(meta_name), meta_json.as_bytes()).await?;

    let empty_records = Vec::new();
    let empty_skips = Vec::new();
    let (records, skips) = match &result.table {
        Some(t) => (&t.records, &t.skips),
        None => (&empty_records, &empty_skips),
    };
    let summary = report::render_document_summary(&result.metadata, records, skips);
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    write_atomic(
        &results_dir.join(format!("OCR_{tag}_{stamp}.txt")),
        summary.as_bytes(),
    )
    .await?;

    if let Some(table) = &result.table {
        let agg = gradecheck_core::aggregate_weighted_grades(table);
        write_atomic(
            &results_dir.join("Grade_with_Units.txt"),
            report::render_grade_with_units(&agg).as_bytes(),
        )
        .await?;

        let grades = grade_sequence(result);
        write_atomic(
            &results_dir.join("grade_scan.txt"),
            render_grade_block(&grades).as_bytes(),
        )
        .await?;
    }

    tracing::info!(dir = %results_dir.display(), "result files written");
    Ok(())
}

async fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let doc_grades = read_grades(&args.document).await?;
    let ref_grades = read_grades(&args.reference).await?;

    let grades = check_tamper(doc_grades.as_deref(), ref_grades.as_deref());

    let metadata = match (
        read_metadata(args.coe_metadata.as_deref()).await?,
        read_metadata(args.cog_metadata.as_deref()).await?,
    ) {
        (Some(coe), Some(cog)) => Some(verify_metadata(&coe, &cog)),
        _ => None,
    };

    let verified =
        grades.is_verified() && metadata.as_ref().is_none_or(|m| m.all_match);
    let verdict = VerificationReport { metadata, grades, verified };
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

/// A missing or empty grade file is an absent source, not an error.
async fn read_grades(path: &Path) -> Result<Option<Vec<CanonicalGrade>>, AppError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => Ok(Some(parse_grade_block(&text))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_metadata(path: Option<&Path>) -> Result<Option<DocumentMetadata>, AppError> {
    let Some(path) = path else { return Ok(None) };
    let text = tokio::fs::read_to_string(path).await?;
    Ok(Some(serde_json::from_str(&text)?))
}
