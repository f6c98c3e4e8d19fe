//! CLI tool for deploying and interacting with the carbon pool contracts.

use carbon_pools::filter::AttributeFilter;
use carbon_pools::pool::bridge::ChannelMessenger;
use carbon_pools::pool::engine::CarbonPool;
use carbon_pools::pool::fees::FlatFeeCalculator;
use carbon_pools::vintage::CarbonVintage;
use odra::casper_types::{U256, U512};
use odra::prelude::{Address, Addressable};
use odra::host::HostEnv;
use odra::schema::casper_contract_schema::NamedCLType;
use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt,
    OdraCli,
};

/// Deploys the eligibility filter.
pub struct FilterDeployScript;

impl DeployScript for FilterDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use odra::host::NoArgs;

        let _filter = AttributeFilter::load_or_deploy(
            &env,
            NoArgs,
            container,
            300_000_000_000 // Gas limit for filter deployment
        )?;

        Ok(())
    }
}

/// Deploys the cross-domain messenger.
pub struct MessengerDeployScript;

impl DeployScript for MessengerDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use carbon_pools::pool::bridge::ChannelMessengerInitArgs;

        let _messenger = ChannelMessenger::load_or_deploy(
            &env,
            ChannelMessengerInitArgs {
                base_fee: U512::zero(),
            },
            container,
            300_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys the external fee calculator, paying fees to the deployer.
pub struct FeeCalculatorDeployScript;

impl DeployScript for FeeCalculatorDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use carbon_pools::pool::fees::FlatFeeCalculatorInitArgs;

        let caller = env.caller();
        let _calculator = FlatFeeCalculator::load_or_deploy(
            &env,
            FlatFeeCalculatorInitArgs {
                recipient: caller,
                deposit_fee_bp: 0,
                redemption_fee_bp: 250,
                seeding_threshold: U256::zero(),
            },
            container,
            300_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys the pool contract.
/// Requires the filter to be deployed first.
pub struct PoolDeployScript;

impl DeployScript for PoolDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use carbon_pools::pool::engine::CarbonPoolInitArgs;

        // Get filter address from container
        let filter = container.contract_ref::<AttributeFilter>(env)?;
        let filter_address = filter.address().clone();

        let _pool = CarbonPool::load_or_deploy(
            &env,
            CarbonPoolInitArgs {
                name: String::from("Pooled Carbon Shares"),
                symbol: String::from("PCS"),
                // 1M units at pool precision
                supply_cap: U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18u64)),
                filter: filter_address,
                score_adjusted: false,
            },
            container,
            500_000_000_000 // Gas limit for pool deployment
        )?;

        Ok(())
    }
}

/// Deploys the complete suite (filter + messenger + pool).
pub struct SuiteDeployScript;

impl DeployScript for SuiteDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        // Deploy the filter first; the pool init needs its address
        FilterDeployScript.deploy(env, container)?;

        MessengerDeployScript.deploy(env, container)?;

        PoolDeployScript.deploy(env, container)?;

        Ok(())
    }
}

/// Scenario to check whether a vintage may be deposited.
pub struct CheckEligibilityScenario;

impl Scenario for CheckEligibilityScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "token",
                "Address of the vintage certificate contract",
                NamedCLType::Key,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let pool = container.contract_ref::<CarbonPool>(env)?;
        let token = args.get_single::<Address>("token")?;

        match pool.check_eligible(token, None) {
            None => println!("Vintage is eligible for deposit"),
            Some(reason) => println!("Vintage rejected: {}", reason),
        }
        Ok(())
    }
}

impl ScenarioMetadata for CheckEligibilityScenario {
    const NAME: &'static str = "check-eligibility";
    const DESCRIPTION: &'static str = "Checks whether a vintage passes the pool's filter";
}

/// Scenario to deposit a vintage into the pool.
pub struct DepositScenario;

impl Scenario for DepositScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "token",
                "Address of the vintage certificate contract",
                NamedCLType::Key,
            ),
            CommandArg::new(
                "amount",
                "Amount to deposit, in the certificate's own precision",
                NamedCLType::U256,
            ),
            CommandArg::new(
                "max_fee",
                "Upper bound on the deposit fee, in pool share precision",
                NamedCLType::U256,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut pool = container.contract_ref::<CarbonPool>(env)?;
        let token = args.get_single::<Address>("token")?;
        let amount = args.get_single::<U256>("amount")?;
        let max_fee = args.get_single::<U256>("max_fee")?;

        env.set_gas(300_000_000_000);
        let minted = pool.try_deposit(token, None, amount, max_fee)?;

        println!("Deposited; {} pool shares minted", minted);
        Ok(())
    }
}

impl ScenarioMetadata for DepositScenario {
    const NAME: &'static str = "deposit";
    const DESCRIPTION: &'static str = "Deposits a vintage into the pool and mints shares";
}

/// Main function to run the CLI tool.
pub fn main() {
    OdraCli::new()
        .about("CLI tool for the carbon pool contract suite")
        // Deploy scripts
        .deploy(FilterDeployScript)
        .deploy(MessengerDeployScript)
        .deploy(FeeCalculatorDeployScript)
        .deploy(PoolDeployScript)
        .deploy(SuiteDeployScript)
        // Contract references
        .contract::<CarbonPool>()
        .contract::<AttributeFilter>()
        .contract::<ChannelMessenger>()
        .contract::<FlatFeeCalculator>()
        .contract::<CarbonVintage>()
        // Scenarios
        .scenario(CheckEligibilityScenario)
        .scenario(DepositScenario)
        .build()
        .run();
}
