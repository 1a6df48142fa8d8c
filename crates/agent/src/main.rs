use analysis_core::{AnalysisError, MetricRecord, MetricsProvider, NarrativeGenerator, PeerFinder};
use anyhow::{bail, Context};
use clap::Parser;
use peer_analysis::PeerAnalysisPipeline;
use peer_discovery::{Sp500Directory, DEFAULT_CSV_URL};
use report_gen::{build_prompt, LlmClient};
use tracing::{info, warn};
use yahoo_client::YahooClient;

/// Peer-relative stock analysis agent
#[derive(Debug, Parser)]
#[command(name = "peerscope", about = "Compare a company's fundamentals against its industry peers")]
struct Args {
    /// Stock ticker symbol to analyze (e.g. AAPL)
    ticker: String,

    /// Path to the S&P 500 constituent CSV (default: $SP500_CSV_PATH or sp500_companies.csv)
    #[arg(long)]
    csv: Option<String>,

    /// Re-download the constituent list before analyzing
    #[arg(long)]
    refresh: bool,

    /// Cap on the number of peers fetched from the data provider
    #[arg(long, default_value_t = 15)]
    max_peers: usize,

    /// Skip the narrative report and print only the quantitative analysis
    #[arg(long)]
    skip_report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    // The pipeline matches tickers exact-string; normalise case here, once.
    let ticker = args.ticker.to_uppercase();

    info!(ticker = ticker.as_str(), "starting full analysis");

    // Step 1: peer discovery
    let csv_path = args
        .csv
        .or_else(|| std::env::var("SP500_CSV_PATH").ok())
        .unwrap_or_else(|| "sp500_companies.csv".to_string());
    let directory = if args.refresh {
        let url = std::env::var("SP500_CSV_URL").unwrap_or_else(|_| DEFAULT_CSV_URL.to_string());
        Sp500Directory::refresh(&url, &csv_path).await?
    } else {
        Sp500Directory::from_csv_path(&csv_path)?
    };

    let mut peers = directory.find_peers(&ticker).await?;
    if peers.is_empty() {
        warn!(ticker = ticker.as_str(), "no peers found in constituent list");
    } else {
        info!(count = peers.len(), "found peer companies");
    }
    peers.truncate(args.max_peers);

    // Step 2: data fetching
    let provider = YahooClient::new();
    let mut all_tickers = vec![ticker.clone()];
    all_tickers.extend(peers.iter().cloned());
    let all_data = provider.fetch_metrics(&all_tickers).await?;
    info!(
        fetched = all_data.len(),
        requested = all_tickers.len(),
        "fetched financial data"
    );

    // Step 3: quantitative peer analysis
    let pipeline = PeerAnalysisPipeline::new();
    let analysis = match pipeline.analyze(&ticker, &all_data) {
        Ok(analysis) => analysis,
        Err(AnalysisError::MissingTarget(_)) => {
            bail!("could not fetch data for target {ticker}; nothing to analyze");
        }
        Err(AnalysisError::NoPeers(_)) => {
            println!("No peer data available for {ticker}; no comparison possible.");
            return Ok(());
        }
        Err(e) => return Err(e).context("peer analysis failed"),
    };
    let Some(target) = all_data.get(&ticker) else {
        bail!("target {ticker} vanished from fetched data");
    };

    // Step 4: narrative report
    let narrative = if args.skip_report {
        None
    } else {
        let llm = LlmClient::with_defaults();
        let prompt = build_prompt(&ticker, target, &analysis);
        match llm.generate(&prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "narrative generation failed");
                Some("Narrative analysis could not be generated.".to_string())
            }
        }
    };

    print_report(&ticker, target, &peers, &analysis, narrative.as_deref());
    Ok(())
}

fn print_report(
    ticker: &str,
    target: &MetricRecord,
    peers: &[String],
    analysis: &analysis_core::PeerAnalysis,
    narrative: Option<&str>,
) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    println!("COMPREHENSIVE INVESTMENT ANALYSIS: {ticker}");
    println!("{rule}\n");

    println!("--- 1) Company Snapshot ---");
    println!("Name: {}", target.name.as_deref().unwrap_or(ticker));
    println!(
        "Sector / Industry: {} / {}",
        target.sector.as_deref().unwrap_or("N/A"),
        target.industry.as_deref().unwrap_or("N/A")
    );
    match target.market_cap {
        Some(cap) => println!("Market Cap: ${cap:.0}\n"),
        None => println!("Market Cap: N/A\n"),
    }

    println!("--- 2) Peer List ---");
    println!("{} peers compared: {}\n", peers.len(), peers.join(", "));

    println!("--- 3) Peer Comparison Table ---");
    println!("{}", analysis.comparison_table);
    println!("Summary Score: {}/100\n", analysis.summary_score);

    if let Some(text) = narrative {
        println!("--- 4) Qualitative Analysis ---");
        println!("{text}\n");
    }

    println!("{rule}");
    println!("Analysis complete.");
    println!("{rule}");
}
