//! In-memory store behind the demo handlers.
//!
//! Clusters are keyed by name and own their nodes, which are keyed by address. A single
//! [`tokio::sync::Mutex`] guards the whole store; every operation holds it for one short
//! critical section and returns clones.

pub mod error;

pub use error::*;

use crate::model::{Cluster, Node};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// A stored value with the id it is served under.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: String,
    pub value: T,
    pub created_at: DateTime<Utc>,
}

impl<T> Record<T> {
    pub fn new(id: impl Into<String>, value: T) -> Self {
        Self {
            id: id.into(),
            value,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct ClusterEntry {
    record: Record<Cluster>,
    nodes: Vec<Record<Node>>,
}

#[derive(Debug, Default)]
pub struct State {
    clusters: Mutex<Vec<ClusterEntry>>,
}

fn find<'a>(clusters: &'a mut [ClusterEntry], name: &str) -> Result<&'a mut ClusterEntry, StateError> {
    clusters
        .iter_mut()
        .find(|c| c.record.id == name)
        .ok_or_else(|| StateError::UnknownCluster(name.to_string()))
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, cluster), fields(id = %cluster.id))]
    pub async fn add_cluster(&self, cluster: Record<Cluster>) -> Result<(), StateError> {
        let mut clusters = self.clusters.lock().await;
        if clusters.iter().any(|c| c.record.id == cluster.id) {
            return Err(StateError::DuplicateCluster(cluster.id));
        }
        clusters.push(ClusterEntry {
            record: cluster,
            nodes: Vec::new(),
        });
        debug!(total = clusters.len(), "Cluster stored");
        Ok(())
    }

    pub async fn get_cluster(&self, name: &str) -> Option<Record<Cluster>> {
        let clusters = self.clusters.lock().await;
        clusters
            .iter()
            .find(|c| c.record.id == name)
            .map(|c| c.record.clone())
    }

    pub async fn clusters(&self) -> Vec<Record<Cluster>> {
        let clusters = self.clusters.lock().await;
        clusters.iter().map(|c| c.record.clone()).collect()
    }

    #[instrument(skip(self, node), fields(id = %node.id))]
    pub async fn add_node(&self, cluster: &str, node: Record<Node>) -> Result<(), StateError> {
        let mut clusters = self.clusters.lock().await;
        let entry = find(&mut clusters, cluster)?;
        if entry.nodes.iter().any(|n| n.id == node.id) {
            return Err(StateError::DuplicateNode(node.id));
        }
        entry.nodes.push(node);
        debug!(total = entry.nodes.len(), "Node stored");
        Ok(())
    }

    pub async fn get_node(&self, cluster: &str, address: &str) -> Option<Record<Node>> {
        let mut clusters = self.clusters.lock().await;
        let entry = find(&mut clusters, cluster).ok()?;
        entry.nodes.iter().find(|n| n.id == address).cloned()
    }

    pub async fn nodes(&self, cluster: &str) -> Result<Vec<Record<Node>>, StateError> {
        let mut clusters = self.clusters.lock().await;
        Ok(find(&mut clusters, cluster)?.nodes.clone())
    }

    #[instrument(skip(self))]
    pub async fn delete_node(&self, cluster: &str, address: &str) -> Result<(), StateError> {
        let mut clusters = self.clusters.lock().await;
        let entry = find(&mut clusters, cluster)?;
        let before = entry.nodes.len();
        entry.nodes.retain(|n| n.id != address);
        if entry.nodes.len() == before {
            return Err(StateError::UnknownNode(address.to_string()));
        }
        debug!("Node removed");
        Ok(())
    }
}
