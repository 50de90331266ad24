//! Blockchain expert dashboard: network settings, health and alerts

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DashboardError;
use crate::ledger::{ChainVerification, Transaction, TransactionStatus, TransactionStore};
use crate::storage::{keys, load_or_default, save_json, Storage};

pub const ALERT_LIMIT: usize = 5;
const RECENT_LEDGER_ENTRIES: usize = 5;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    /// Percent, one decimal place
    pub network_health: f64,
    pub security_score: u32,
    pub active_nodes: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusSettings {
    pub algorithm: String,
    /// Seconds
    pub block_time: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    pub encryption_level: String,
    pub access_control: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaultToleranceSettings {
    pub redundancy_level: String,
    pub recovery_time: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SystemAlert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted expert view model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpertDashboard {
    pub stats: NetworkStats,
    pub consensus_settings: ConsensusSettings,
    pub security_settings: SecuritySettings,
    pub fault_tolerance: FaultToleranceSettings,
    /// Newest first
    #[serde(default)]
    pub system_alerts: Vec<SystemAlert>,
}

impl Default for ExpertDashboard {
    fn default() -> Self {
        Self {
            stats: NetworkStats {
                network_health: 100.0,
                security_score: 100,
                active_nodes: 0,
            },
            consensus_settings: ConsensusSettings {
                algorithm: "Proof of Authority".to_string(),
                block_time: 15,
            },
            security_settings: SecuritySettings {
                encryption_level: "AES-256".to_string(),
                access_control: "Role-Based".to_string(),
            },
            fault_tolerance: FaultToleranceSettings {
                redundancy_level: "3x Replication".to_string(),
                recovery_time: "< 30 seconds".to_string(),
            },
            system_alerts: Vec::new(),
        }
    }
}

impl ExpertDashboard {
    fn alert(&mut self, level: AlertLevel, title: &str, message: &str) {
        self.system_alerts.insert(
            0,
            SystemAlert {
                id: Uuid::new_v4(),
                level,
                title: title.to_string(),
                message: message.to_string(),
                timestamp: Utc::now(),
            },
        );
        self.system_alerts.truncate(ALERT_LIMIT);
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusPatch {
    pub algorithm: Option<String>,
    pub block_time: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPatch {
    pub encryption_level: Option<String>,
    pub access_control: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FaultTolerancePatch {
    pub redundancy_level: Option<String>,
    pub recovery_time: Option<String>,
}

/// Ledger figures shown next to the settings
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_transactions: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub failed: usize,
    pub recent_transactions: Vec<Transaction>,
    pub chain: ChainVerification,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExpertOverview {
    #[serde(flatten)]
    pub dashboard: ExpertDashboard,
    pub ledger: LedgerSummary,
}

/// Shared dashboard for blockchain experts
pub struct ExpertDashboardService {
    storage: Arc<dyn Storage>,
    ledger: Arc<TransactionStore>,
    dashboard: RwLock<ExpertDashboard>,
}

impl ExpertDashboardService {
    pub fn load(storage: Arc<dyn Storage>, ledger: Arc<TransactionStore>) -> Self {
        let dashboard = load_or_default(storage.as_ref(), keys::EXPERT_DASHBOARD);
        Self {
            storage,
            ledger,
            dashboard: RwLock::new(dashboard),
        }
    }

    /// Apply `change`, raise an alert and persist; rolls back on failure
    async fn modify<F>(
        &self,
        change: F,
        level: AlertLevel,
        title: &str,
        message: &str,
    ) -> Result<ExpertDashboard, DashboardError>
    where
        F: FnOnce(&mut ExpertDashboard),
    {
        let mut dashboard = self.dashboard.write().await;
        let previous = dashboard.clone();

        change(&mut *dashboard);
        dashboard.alert(level, title, message);

        if let Err(e) = save_json(self.storage.as_ref(), keys::EXPERT_DASHBOARD, &*dashboard) {
            *dashboard = previous;
            return Err(e.into());
        }
        tracing::info!(alert = title, "Expert dashboard updated");
        Ok(dashboard.clone())
    }

    pub async fn dashboard(&self) -> ExpertDashboard {
        self.dashboard.read().await.clone()
    }

    /// Settings together with live ledger figures
    pub async fn overview(&self) -> ExpertOverview {
        let dashboard = self.dashboard().await;
        let transactions = self.ledger.list().await;
        let count = |status: TransactionStatus| {
            transactions.iter().filter(|t| t.status == status).count()
        };

        let ledger = LedgerSummary {
            total_transactions: transactions.len(),
            confirmed: count(TransactionStatus::Confirmed),
            pending: count(TransactionStatus::Pending),
            failed: count(TransactionStatus::Failed),
            recent_transactions: self.ledger.recent(RECENT_LEDGER_ENTRIES).await,
            chain: self.ledger.verify_chain().await,
        };

        ExpertOverview { dashboard, ledger }
    }

    pub async fn update_consensus(
        &self,
        patch: ConsensusPatch,
    ) -> Result<ExpertDashboard, DashboardError> {
        if patch.block_time == Some(0) {
            return Err(DashboardError::Validation(
                "Block time must be at least 1 second".to_string(),
            ));
        }
        self.modify(
            |d| {
                if let Some(algorithm) = patch.algorithm {
                    d.consensus_settings.algorithm = algorithm;
                }
                if let Some(block_time) = patch.block_time {
                    d.consensus_settings.block_time = block_time;
                }
            },
            AlertLevel::Info,
            "Consensus Updated",
            "Consensus settings have been modified",
        )
        .await
    }

    pub async fn update_security(
        &self,
        patch: SecurityPatch,
    ) -> Result<ExpertDashboard, DashboardError> {
        self.modify(
            |d| {
                if let Some(level) = patch.encryption_level {
                    d.security_settings.encryption_level = level;
                }
                if let Some(control) = patch.access_control {
                    d.security_settings.access_control = control;
                }
            },
            AlertLevel::Success,
            "Security Updated",
            "Security settings have been modified",
        )
        .await
    }

    pub async fn update_fault_tolerance(
        &self,
        patch: FaultTolerancePatch,
    ) -> Result<ExpertDashboard, DashboardError> {
        self.modify(
            |d| {
                if let Some(redundancy) = patch.redundancy_level {
                    d.fault_tolerance.redundancy_level = redundancy;
                }
                if let Some(recovery) = patch.recovery_time {
                    d.fault_tolerance.recovery_time = recovery;
                }
            },
            AlertLevel::Info,
            "Fault Tolerance Updated",
            "Fault tolerance settings have been modified",
        )
        .await
    }

    /// Refresh the simulated health figures
    pub async fn generate_health_report(&self) -> Result<ExpertDashboard, DashboardError> {
        let (health, security) = {
            let mut rng = rand::thread_rng();
            let health: f64 = rng.gen_range(95.0..=100.0);
            ((health * 10.0).round() / 10.0, rng.gen_range(90..=100))
        };

        self.modify(
            |d| {
                d.stats.network_health = health;
                d.stats.security_score = security;
            },
            AlertLevel::Info,
            "Health Report Generated",
            "System health metrics have been refreshed",
        )
        .await
    }

    /// Restore defaults and drop the stored copy
    pub async fn reset(&self) -> Result<ExpertDashboard, DashboardError> {
        let mut dashboard = self.dashboard.write().await;
        self.storage.remove_item(keys::EXPERT_DASHBOARD)?;
        *dashboard = ExpertDashboard::default();
        Ok(dashboard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewTransaction, TransactionType};
    use crate::storage::MemoryStorage;
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryStorage>, Arc<TransactionStore>, ExpertDashboardService) {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = Arc::new(TransactionStore::load(storage.clone()));
        let service = ExpertDashboardService::load(storage.clone(), ledger.clone());
        (storage, ledger, service)
    }

    #[tokio::test]
    async fn test_settings_merge_and_alert() {
        let (_storage, _ledger, service) = service();

        let dashboard = service
            .update_consensus(ConsensusPatch {
                algorithm: None,
                block_time: Some(5),
            })
            .await
            .unwrap();

        assert_eq!(dashboard.consensus_settings.algorithm, "Proof of Authority");
        assert_eq!(dashboard.consensus_settings.block_time, 5);
        assert_eq!(dashboard.system_alerts.len(), 1);
        assert_eq!(dashboard.system_alerts[0].title, "Consensus Updated");
    }

    #[tokio::test]
    async fn test_alerts_keep_five_newest() {
        let (_storage, _ledger, service) = service();

        for _ in 0..4 {
            service
                .update_security(SecurityPatch::default())
                .await
                .unwrap();
        }
        for _ in 0..3 {
            service
                .update_fault_tolerance(FaultTolerancePatch::default())
                .await
                .unwrap();
        }

        let dashboard = service.dashboard().await;
        assert_eq!(dashboard.system_alerts.len(), ALERT_LIMIT);
        assert_eq!(dashboard.system_alerts[0].title, "Fault Tolerance Updated");
        assert_eq!(dashboard.system_alerts[4].level, AlertLevel::Success);
    }

    #[tokio::test]
    async fn test_health_report_ranges() {
        let (_storage, _ledger, service) = service();

        for _ in 0..20 {
            let dashboard = service.generate_health_report().await.unwrap();
            assert!((95.0..=100.0).contains(&dashboard.stats.network_health));
            assert!((90..=100).contains(&dashboard.stats.security_score));
        }
    }

    #[tokio::test]
    async fn test_overview_reads_ledger() {
        let (_storage, ledger, service) = service();
        ledger
            .append(NewTransaction::new(
                TransactionType::Purchase,
                Decimal::from(10),
                TransactionStatus::Confirmed,
            ))
            .await
            .unwrap();
        ledger
            .append(NewTransaction::new(
                TransactionType::Send,
                Decimal::from(5),
                TransactionStatus::Pending,
            ))
            .await
            .unwrap();

        let overview = service.overview().await;
        assert_eq!(overview.ledger.total_transactions, 2);
        assert_eq!(overview.ledger.confirmed, 1);
        assert_eq!(overview.ledger.pending, 1);
        assert!(overview.ledger.chain.valid);
    }

    #[tokio::test]
    async fn test_persisted_and_reset() {
        let (storage, ledger, service) = service();
        service
            .update_consensus(ConsensusPatch {
                algorithm: Some("Raft".to_string()),
                block_time: None,
            })
            .await
            .unwrap();

        let reloaded = ExpertDashboardService::load(storage, ledger);
        assert_eq!(
            reloaded.dashboard().await.consensus_settings.algorithm,
            "Raft"
        );

        let dashboard = reloaded.reset().await.unwrap();
        assert_eq!(dashboard, ExpertDashboard::default());
    }

    #[tokio::test]
    async fn test_zero_block_time_rejected() {
        let (_storage, _ledger, service) = service();
        let result = service
            .update_consensus(ConsensusPatch {
                algorithm: None,
                block_time: Some(0),
            })
            .await;
        assert!(matches!(result, Err(DashboardError::Validation(_))));
        assert!(service.dashboard().await.system_alerts.is_empty());
    }
}
