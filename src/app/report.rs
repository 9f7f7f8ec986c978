//! `sector-report`: expiration and pledge breakdown for one miner.

use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use tracing::info;

use crate::app::{emit, load_env};
use crate::chain::{ChainApi, LotusClient};
use crate::cli::{ReportCli, Selector};
use crate::clock::ChainClock;
use crate::domain::{Address, TipSetKey};
use crate::error::AppError;
use crate::report::{format_daily_lines, format_overview, format_sector_detail};
use crate::sectors::{aggregate, resolve_detail, total_pledge};
use crate::store::{Store, read_dsn};

const MINER_HINT: &str =
    "Hint: you are querying by miner address; the cluster selector (-c) is recommended, see -h for usage.";

/// Entry point for the `sector-report` binary.
pub fn run() -> Result<(), AppError> {
    load_env();
    let cli = ReportCli::parse();
    let stdout = io::stdout();
    run_with(
        &cli,
        |endpoint, token| LotusClient::connect(endpoint, token),
        |path| Store::open(&read_dsn(path)?),
        &mut stdout.lock(),
    )
}

/// Run the report with injectable node and store constructors.
///
/// The selector is validated before anything is opened: a usage error is
/// printed to `out` and turned into a bare exit code 2.
pub fn run_with<C, W>(
    cli: &ReportCli,
    connect: impl FnOnce(&str, Option<&str>) -> Result<C, AppError>,
    open_store: impl FnOnce(&Path) -> Result<Store, AppError>,
    out: &mut W,
) -> Result<(), AppError>
where
    C: ChainApi,
    W: Write,
{
    let selector = match cli.selector() {
        Ok(selector) => selector,
        Err(err) => {
            emit(out, format_args!("Error: {err}"))?;
            return Err(AppError::exit(err.exit_code()));
        }
    };

    let clock = ChainClock::new(cli.zone)?;
    let pinned_at = cli
        .date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| clock.parse_datetime(d))
        .transpose()?;

    let chain = connect(&cli.lotus_api, cli.token.as_deref())
        .map_err(|e| e.context("connect to lotus api failed"))?;

    let tsk = match pinned_at {
        Some(at) => {
            let height = clock.timestamp_to_epoch(&at);
            chain
                .chain_get_tipset_by_height(height, &TipSetKey::default())
                .map_err(|e| e.context(format!("failed to obtain tipset at height {height}")))?
                .key()
        }
        None => TipSetKey::default(),
    };

    let miner = match selector {
        Selector::Miner(miner) => {
            emit(out, MINER_HINT)?;
            parse_miner(&miner)?
        }
        Selector::Cluster(cluster) => {
            let store = open_store(&cli.dsn_file)?;
            let miner = store
                .lookup_miner_by_cluster(&cluster)
                .map_err(|e| e.context("failed to query miner, please confirm whether the cluster is correct"))?;
            let addr = parse_miner(&miner)?;
            emit(out, format_args!("cluster: {cluster}, miner: {miner}, querying..."))?;
            addr
        }
    };

    let sectors = chain
        .state_miner_active_sectors(&miner, &tsk)
        .map_err(|e| e.context("failed to get miner active sectors"))?;
    info!(
        miner = %miner,
        sectors = sectors.len(),
        pledge = %total_pledge(&sectors).to_fil(),
        "fetched active sectors"
    );

    if cli.detail {
        for sector in &sectors {
            let detail = resolve_detail(&chain, sector, &tsk);
            emit(out, format_sector_detail(&detail, &clock))?;
        }
    }

    let aggregation = aggregate(&sectors, &clock);
    write!(out, "{}{}", format_daily_lines(&aggregation), format_overview(&aggregation))
        .map_err(|e| AppError::io(format!("write output: {e}")))?;
    Ok(())
}

fn parse_miner(miner: &str) -> Result<Address, AppError> {
    miner
        .parse()
        .map_err(|e: AppError| e.context(format!("convert miner {miner} to address failed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chain::testing::FakeChain;
    use crate::domain::{Cid, DealWeight, SectorRecord, TokenAmount};
    use crate::error::ErrorKind;

    const MINER: &str = "f01000";

    fn cli(args: &[&str]) -> ReportCli {
        let base = ["sector-report", "--tz", "utc", "--dsn-file", "/nonexistent/dsn"];
        ReportCli::try_parse_from(base.iter().chain(args.iter()).copied()).unwrap()
    }

    fn clock() -> ChainClock {
        ChainClock::new("utc".parse().unwrap()).unwrap()
    }

    fn epoch_at(text: &str) -> i64 {
        let clock = clock();
        clock.timestamp_to_epoch(&clock.parse_datetime(text).unwrap())
    }

    fn sector(number: u64, expires: &str, dw: u128, vdw: u128, pledge_fil: i64, deals: Vec<u64>) -> SectorRecord {
        SectorRecord {
            sector_number: number,
            sealed_cid: Cid::new("bagboea4b5abc"),
            deal_ids: deals,
            activation: 2_000_000,
            expiration: epoch_at(expires),
            deal_weight: DealWeight::new(dw),
            verified_deal_weight: DealWeight::new(vdw),
            initial_pledge: TokenAmount::from_whole(pledge_fil),
            sector_key_cid: None,
        }
    }

    fn chain() -> FakeChain {
        FakeChain::default().with_head(3_400_000, "bafyhead").with_sectors(
            MINER,
            vec![
                sector(1, "2023-11-01 08:00:00", 0, 0, 1, Vec::new()),
                sector(2, "2023-11-01 09:00:00", 0, 3, 2, vec![77]),
                sector(3, "2023-11-02 10:00:00", 7, 0, 3, Vec::new()),
            ],
        )
    }

    fn no_store(_: &Path) -> Result<Store, AppError> {
        Err(AppError::io("store should not be opened"))
    }

    fn run_to_string(cli: &ReportCli, chain: FakeChain, store: Option<Store>) -> (Result<(), AppError>, String) {
        let mut out = Vec::new();
        let result = run_with(
            cli,
            |_, _| Ok(chain),
            |path| store.ok_or_else(|| AppError::io(format!("no store at {}", path.display()))),
            &mut out,
        );
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn conflicting_selectors_exit_2_without_rpc() {
        let chain = chain();
        let mut out = Vec::new();
        let err = run_with(&cli(&["-m", MINER, "-c", "hk01"]), |_, _| Ok(&chain), no_store, &mut out).unwrap_err();

        assert_eq!(chain.calls(), 0);
        assert_eq!(err.kind(), ErrorKind::Exit);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Error: Please provide either Miner or Cluster, but not both or neither.\n"
        );
    }

    #[test]
    fn miner_report_prints_days_and_overview() {
        let (result, text) = run_to_string(&cli(&["-m", MINER]), chain(), None);
        result.unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], MINER_HINT);
        assert!(lines[1].starts_with(
            "2023-11-01: cc sectors 1, pledge: 1.0000 FIL, dc sectors 1, pledge: 2.0000 FIL, od sectors 0"
        ));
        assert!(lines[2].starts_with("2023-11-02:"));
        assert!(lines[2].contains("od sectors 1, pledge: 3.0000 FIL"));
        assert!(text.contains("total sectors \t3, pledge: 6.0000 FIL"));
    }

    #[test]
    fn cluster_is_resolved_through_the_store() {
        let store = Store::in_memory().unwrap();
        store.upsert_cluster("hk01", MINER).unwrap();

        let (result, text) = run_to_string(&cli(&["-c", "hk01"]), chain(), Some(store));
        result.unwrap();
        assert!(text.starts_with("cluster: hk01, miner: f01000, querying...\n"));
    }

    #[test]
    fn unknown_cluster_is_a_lookup_error() {
        let store = Store::in_memory().unwrap();
        let (result, _) = run_to_string(&cli(&["-c", "nope"]), chain(), Some(store));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Lookup);
    }

    #[test]
    fn date_pins_queries_to_the_tipset_at_that_height() {
        let height = epoch_at("2023-11-01 00:00:00");
        let chain = chain().with_tipset(height, "bafypinned");
        let cli = cli(&["-m", MINER, "-d", "2023-11-01 00:00:00"]);

        run_with(&cli, |_, _| Ok(&chain), no_store, &mut Vec::new()).unwrap();
        assert_eq!(chain.last_tipset_key(), Some(TipSetKey::new(vec![Cid::new("bafypinned")])));
    }

    #[test]
    fn missing_tipset_for_date_aborts_the_report() {
        let chain = chain();
        let err = run_with(&cli(&["-m", MINER, "-d", "2023-11-01 00:00:00"]), |_, _| Ok(&chain), no_store, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rpc);
        assert!(err.message().starts_with("failed to obtain tipset at height"));
    }

    #[test]
    fn malformed_date_is_a_format_error_before_connecting() {
        let chain = chain();
        let err = run_with(&cli(&["-m", MINER, "-d", "2023/11/01"]), |_, _| Ok(&chain), no_store, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(chain.calls(), 0);
    }

    #[test]
    fn detail_mode_prints_one_line_per_sector() {
        let provider: Address = MINER.parse().unwrap();
        let chain = chain().with_deal(77, provider, 2_400_000);
        let (result, text) = run_to_string(&cli(&["-m", MINER, "-v"]), chain, None);
        result.unwrap();

        let details: Vec<&str> = text.lines().filter(|l| l.starts_with("type:")).collect();
        assert_eq!(details.len(), 3);
        assert!(details[1].starts_with("type:dc,sector:2,"));
        assert!(details[1].contains("expandable:true"));
        assert!(details[0].contains("expandable:false"));
    }
}
