//! Portfolio aggregation across chains
//!
//! A refresh resolves prices once, queries every configured chain
//! concurrently for the selected account and waits for all of them to settle.
//! Failed chains are listed in the snapshot and contribute nothing to the
//! total. Results computed for a selection that changed mid-flight are
//! dropped instead of overwriting fresher state.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::balance::{ChainBalance, ChainBalanceFetcher};
use crate::chains::ChainConfig;
use crate::price::PriceFetcher;
use crate::session::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainFailure {
    pub chain: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub address: String,
    pub generation: u64,
    pub balances: Vec<ChainBalance>,
    pub failures: Vec<ChainFailure>,
    pub total_usd_value: f64,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// (chains that contributed, chains attempted)
    pub fn coverage(&self) -> (usize, usize) {
        (self.balances.len(), self.balances.len() + self.failures.len())
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub enum PortfolioState {
    #[default]
    Idle,
    Loading {
        generation: u64,
    },
    Ready(PortfolioSnapshot),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Ready(PortfolioSnapshot),
    /// Every chain failed
    Failed(Vec<ChainFailure>),
    /// The selection changed while fetching
    Discarded { started: u64, current: u64 },
    NoSelection,
}

#[derive(Default)]
struct Inner {
    state: PortfolioState,
    last: Option<PortfolioSnapshot>,
}

pub struct PortfolioAggregator {
    fetcher: ChainBalanceFetcher,
    prices: Arc<PriceFetcher>,
    chains: Vec<ChainConfig>,
    selection: watch::Receiver<Selection>,
    inner: RwLock<Inner>,
}

impl PortfolioAggregator {
    pub fn new(
        fetcher: ChainBalanceFetcher,
        prices: Arc<PriceFetcher>,
        chains: Vec<ChainConfig>,
        selection: watch::Receiver<Selection>,
    ) -> Self {
        Self {
            fetcher,
            prices,
            chains,
            selection,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn state(&self) -> PortfolioState {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).state.clone()
    }

    /// Latest completed snapshot, kept while a newer refresh is loading
    pub fn snapshot(&self) -> Option<PortfolioSnapshot> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).last.clone()
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut inner);
    }

    /// Fetch every chain for the current selection and publish the result
    pub async fn refresh(&self) -> RefreshOutcome {
        let selection = self.selection.borrow().clone();
        let Some(address) = selection.address else {
            self.update(|inner| {
                inner.state = PortfolioState::Idle;
                inner.last = None;
            });
            return RefreshOutcome::NoSelection;
        };

        let started = selection.generation;
        let mut prior = PortfolioState::Idle;
        self.update(|inner| {
            prior = std::mem::replace(
                &mut inner.state,
                PortfolioState::Loading { generation: started },
            );
        });

        let prices = self.prices.prices().await;
        let results = join_all(self.chains.iter().map(|chain| {
            let prices = &prices;
            let address = &address;
            async move { (chain, self.fetcher.fetch(chain, address, prices).await) }
        }))
        .await;

        let now = self.selection.borrow().clone();
        let current = now.generation;
        if current != started {
            log::info!(
                "Discarding portfolio for selection {} (now {})",
                started,
                current
            );
            self.update(|inner| {
                let still_loading = matches!(
                    inner.state,
                    PortfolioState::Loading { generation } if generation == started
                );
                if now.address.is_none() {
                    inner.state = PortfolioState::Idle;
                    inner.last = None;
                } else if still_loading {
                    // A newer refresh may already own the state
                    inner.state = prior;
                }
            });
            return RefreshOutcome::Discarded { started, current };
        }

        let mut balances = Vec::new();
        let mut failures = Vec::new();
        for (chain, result) in results {
            match result {
                Ok(balance) => balances.push(balance),
                Err(e) => {
                    log::warn!("Failed to fetch {} balance: {}", chain.name, e);
                    failures.push(ChainFailure {
                        chain: chain.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if balances.is_empty() && !failures.is_empty() {
            let message = format!("Failed to fetch balances from all {} chains", failures.len());
            self.update(|inner| inner.state = PortfolioState::Error(message));
            return RefreshOutcome::Failed(failures);
        }

        let total_usd_value = balances.iter().map(|b| b.total_usd_value).sum();
        let snapshot = PortfolioSnapshot {
            address,
            generation: started,
            balances,
            failures,
            total_usd_value,
            updated_at: Utc::now(),
        };

        let (ok, attempted) = snapshot.coverage();
        log::info!(
            "Portfolio ${:.2} from {}/{} chains",
            snapshot.total_usd_value,
            ok,
            attempted
        );

        self.update(|inner| {
            inner.state = PortfolioState::Ready(snapshot.clone());
            inner.last = Some(snapshot.clone());
        });
        RefreshOutcome::Ready(snapshot)
    }

    /// Refresh on start, on every tick and on every selection change until `shutdown` resolves
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut selection = self.selection.clone();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
                changed = selection.changed() => {
                    if changed.is_err() {
                        log::info!("Session closed, stopping portfolio refresh");
                        break;
                    }
                }
            }
            self.refresh().await;
        }
        log::info!("Portfolio refresh loop stopped");
    }
}
