//! Deposit eligibility screening.
//!
//! Pools consult an [`EligibilityFilter`] before accepting a vintage.
//! The filter answers with `None` (eligible) or a verbatim reason string,
//! which the pool surfaces to callers through its quoting view. The
//! filter may live under independent control; a revert inside it
//! propagates to the pool caller untouched.
use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::FilterError;
use crate::vintage::VintageTokenContractRef;

/// Interface the pool consumes to screen deposits.
#[odra::external_contract]
pub trait EligibilityFilter {
    /// `None` when the vintage may be deposited, `Some(reason)` otherwise.
    fn check_eligible(&self, token: Address, sub_id: Option<U256>) -> Option<String>;
}

/// Event emitted when the deny list changes.
#[odra::event]
pub struct DenyListUpdated {
    /// Certificate contract affected
    pub token: Address,
    /// New deny state
    pub denied: bool,
}

/// Event emitted when the allow list changes.
#[odra::event]
pub struct AllowListUpdated {
    /// Certificate contract affected
    pub token: Address,
    /// New allow state
    pub allowed: bool,
}

/// Attribute-based eligibility filter.
///
/// Screens on a deny list, an optional allow list, an optional region
/// allow list, an excluded-methodology list and a minimum vintage start.
#[odra::module]
pub struct AttributeFilter {
    /// Filter admin
    admin: Var<Address>,
    /// Vintages that may never be deposited
    denied: Mapping<Address, bool>,
    /// Explicitly allowed vintages, consulted when `require_allow_list`
    allowed: Mapping<Address, bool>,
    /// Whether only allow-listed vintages are accepted
    require_allow_list: Var<bool>,
    /// Accepted regions, consulted when `restrict_regions`
    allowed_regions: Mapping<String, bool>,
    /// Whether the region allow list is enforced
    restrict_regions: Var<bool>,
    /// Methodologies that are never accepted
    excluded_methodologies: Mapping<String, bool>,
    /// Earliest accepted vintage start (unix seconds); 0 disables the check
    min_vintage_begin: Var<u64>,
}

#[odra::module]
impl AttributeFilter {
    /// Initialize the filter. The deployer becomes the admin.
    pub fn init(&mut self) {
        self.admin.set(self.env().caller());
        self.require_allow_list.set(false);
        self.restrict_regions.set(false);
        self.min_vintage_begin.set(0);
    }

    /// Screen a vintage for deposit.
    ///
    /// List checks run before attribute checks so a deny-listed vintage
    /// is rejected without touching the certificate contract.
    pub fn check_eligible(&self, token: Address, sub_id: Option<U256>) -> Option<String> {
        if self.denied.get(&token).unwrap_or(false) {
            return Some(String::from("vintage is on the deny list"));
        }
        if self.require_allow_list.get_or_default() && !self.allowed.get(&token).unwrap_or(false) {
            return Some(String::from("vintage is not on the allow list"));
        }

        let vintage = VintageTokenContractRef::new(self.env(), token);
        let attrs = vintage.attributes(sub_id);

        if self.restrict_regions.get_or_default()
            && !self.allowed_regions.get(&attrs.region).unwrap_or(false)
        {
            return Some(String::from("region is not accepted by this pool"));
        }
        if self
            .excluded_methodologies
            .get(&attrs.methodology)
            .unwrap_or(false)
        {
            return Some(String::from("methodology is excluded by this pool"));
        }
        let min_begin = self.min_vintage_begin.get_or_default();
        if min_begin > 0 && attrs.vintage_begin < min_begin {
            return Some(String::from("vintage is older than the accepted minimum"));
        }
        None
    }

    // Admin surface

    /// Add or remove a vintage from the deny list
    pub fn set_denied(&mut self, token: Address, denied: bool) {
        self.only_admin();
        self.denied.set(&token, denied);
        self.env().emit_event(DenyListUpdated { token, denied });
    }

    /// Add or remove a vintage from the allow list
    pub fn set_allowed(&mut self, token: Address, allowed: bool) {
        self.only_admin();
        self.allowed.set(&token, allowed);
        self.env().emit_event(AllowListUpdated { token, allowed });
    }

    /// Toggle allow-list enforcement
    pub fn set_require_allow_list(&mut self, required: bool) {
        self.only_admin();
        self.require_allow_list.set(required);
    }

    /// Accept or reject a region
    pub fn set_region_allowed(&mut self, region: String, allowed: bool) {
        self.only_admin();
        self.allowed_regions.set(&region, allowed);
    }

    /// Toggle region enforcement
    pub fn set_restrict_regions(&mut self, restricted: bool) {
        self.only_admin();
        self.restrict_regions.set(restricted);
    }

    /// Exclude or re-admit a methodology
    pub fn set_methodology_excluded(&mut self, methodology: String, excluded: bool) {
        self.only_admin();
        self.excluded_methodologies.set(&methodology, excluded);
    }

    /// Set the earliest accepted vintage start; 0 disables the check
    pub fn set_min_vintage_begin(&mut self, min_begin: u64) {
        self.only_admin();
        self.min_vintage_begin.set(min_begin);
    }

    /// Filter admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(FilterError::Unauthorized)
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(FilterError::Unauthorized);
        if self.env().caller() != admin {
            self.env().revert(FilterError::Unauthorized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
    use crate::vintage::{CarbonVintage, CarbonVintageInitArgs, VintageAttributes};

    fn deploy_vintage(env: &HostEnv, region: &str, methodology: &str, begin: u64) -> Address {
        let vintage = CarbonVintage::deploy(
            env,
            CarbonVintageInitArgs {
                name: String::from("TCO2"),
                symbol: String::from("TCO2"),
                decimals: 18,
                attributes: VintageAttributes {
                    project_id: String::from("VCS-1"),
                    region: String::from(region),
                    methodology: String::from(methodology),
                    vintage_begin: begin,
                },
            },
        );
        *vintage.address()
    }

    #[test]
    fn test_open_filter_accepts_everything() {
        let env = odra_test::env();
        let filter = AttributeFilter::deploy(&env, NoArgs);
        let token = deploy_vintage(&env, "LATAM", "VM0015", 1_546_300_800);
        assert_eq!(filter.check_eligible(token, None), None);
    }

    #[test]
    fn test_deny_list_rejects_with_reason() {
        let env = odra_test::env();
        let mut filter = AttributeFilter::deploy(&env, NoArgs);
        let token = deploy_vintage(&env, "LATAM", "VM0015", 1_546_300_800);

        filter.set_denied(token, true);
        assert_eq!(
            filter.check_eligible(token, None),
            Some(String::from("vintage is on the deny list"))
        );

        filter.set_denied(token, false);
        assert_eq!(filter.check_eligible(token, None), None);
    }

    #[test]
    fn test_allow_list_enforcement() {
        let env = odra_test::env();
        let mut filter = AttributeFilter::deploy(&env, NoArgs);
        let token = deploy_vintage(&env, "LATAM", "VM0015", 1_546_300_800);

        filter.set_require_allow_list(true);
        assert_eq!(
            filter.check_eligible(token, None),
            Some(String::from("vintage is not on the allow list"))
        );

        filter.set_allowed(token, true);
        assert_eq!(filter.check_eligible(token, None), None);
    }

    #[test]
    fn test_attribute_constraints() {
        let env = odra_test::env();
        let mut filter = AttributeFilter::deploy(&env, NoArgs);
        let token = deploy_vintage(&env, "LATAM", "VM0015", 1_546_300_800);

        filter.set_restrict_regions(true);
        assert_eq!(
            filter.check_eligible(token, None),
            Some(String::from("region is not accepted by this pool"))
        );
        filter.set_region_allowed(String::from("LATAM"), true);
        assert_eq!(filter.check_eligible(token, None), None);

        filter.set_methodology_excluded(String::from("VM0015"), true);
        assert_eq!(
            filter.check_eligible(token, None),
            Some(String::from("methodology is excluded by this pool"))
        );
        filter.set_methodology_excluded(String::from("VM0015"), false);

        filter.set_min_vintage_begin(1_600_000_000);
        assert_eq!(
            filter.check_eligible(token, None),
            Some(String::from("vintage is older than the accepted minimum"))
        );
    }

    #[test]
    fn test_admin_gating() {
        let env = odra_test::env();
        let mut filter = AttributeFilter::deploy(&env, NoArgs);
        let token = deploy_vintage(&env, "LATAM", "VM0015", 0);

        env.set_caller(env.get_account(1));
        assert!(filter.try_set_denied(token, true).is_err());
    }
}
