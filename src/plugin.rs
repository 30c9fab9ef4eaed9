//! HR plugin
//!
//! Holds the two kernel functions the model chooses between: a leave
//! balance lookup against the relational store and a policy search against
//! the vector store. The string-returning functions are what the model sees;
//! they never fail, reporting store errors as text instead.

use crate::leaves::LeaveStore;
use crate::models::{LeaveBalance, PolicyMatch};
use crate::policy::PolicyStore;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, warn};

pub const PLUGIN_NAME: &str = "HRPlugin";

pub const GET_LEAVE_BALANCE_DESCRIPTION: &str = "Gets the leave balance for a specific employee from the database. Use this when users ask about remaining leave days, vacation balance, or time off for a specific person.";

pub const QUERY_POLICY_DESCRIPTION: &str = "Searches company HR policies and procedures. Use this for questions about leave policies, company rules, entitlements, procedures, or general HR information.";

pub const NO_POLICY_FOUND: &str = "No relevant policy found.";

pub struct HrPlugin {
    leaves: Arc<dyn LeaveStore>,
    policies: Arc<dyn PolicyStore>,
}

impl HrPlugin {
    pub fn new(leaves: Arc<dyn LeaveStore>, policies: Arc<dyn PolicyStore>) -> Self {
        Self { leaves, policies }
    }

    pub fn policies(&self) -> &Arc<dyn PolicyStore> {
        &self.policies
    }

    pub async fn lookup_balance(&self, employee_name: &str) -> Result<Option<LeaveBalance>> {
        let balance = self.leaves.balance(employee_name).await?;
        debug!(employee = %employee_name, found = balance.is_some(), "Leave balance lookup");

        Ok(balance.map(|balance_days| LeaveBalance {
            employee: employee_name.to_string(),
            balance_days,
        }))
    }

    /// Closest policy document, if any
    pub async fn search_policy(&self, query: &str) -> Result<Option<PolicyMatch>> {
        let matches = self.policies.query(query, 1).await?;
        debug!(query = %query, matches = matches.len(), "Policy search");
        Ok(matches.into_iter().next())
    }

    pub async fn get_leave_balance(&self, employee_name: &str) -> String {
        describe_balance(employee_name, self.lookup_balance(employee_name).await)
    }

    pub async fn query_policy(&self, query: &str) -> String {
        describe_policy(query, self.search_policy(query).await)
    }
}

/// Text the model receives for a balance lookup
pub fn describe_balance(employee_name: &str, result: Result<Option<LeaveBalance>>) -> String {
    match result {
        Ok(Some(balance)) => format!(
            "{} has {} days of annual leave remaining.",
            balance.employee, balance.balance_days
        ),
        Ok(None) => format!("No leave record found for {}.", employee_name),
        Err(e) => {
            warn!(employee = %employee_name, error = %e, "Leave balance lookup failed");
            format!("Error retrieving leave balance: {}", e)
        }
    }
}

/// Text the model receives for a policy search
pub fn describe_policy(query: &str, result: Result<Option<PolicyMatch>>) -> String {
    match result {
        Ok(Some(found)) => found.document.content,
        Ok(None) => NO_POLICY_FOUND.to_string(),
        Err(e) => {
            warn!(query = %query, error = %e, "Policy search failed");
            format!("Error retrieving policy information: {}", e)
        }
    }
}
