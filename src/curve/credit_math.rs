// src/curve/credit_math.rs

use tracing::debug;

use crate::config::PoolConfig;
use crate::curve::fees::{borrow_fee, lend_fee};
use crate::curve::{Claims, ConstantProduct, Due, Reserves};
use crate::error::{CreditError, Result};
use crate::math::full_math::{
    checked_add, checked_mul, checked_sub, mul_div, mul_div_up, shift_right_up, wide_mul,
};
use crate::math::U256;

// Pondérations temporelles (virgule fixe) des réserves y et z.
const INTEREST_SHIFT: u32 = 32;
const COLLATERAL_SHIFT: u32 = 25;
// Premier dépôt : liquidité = x << 16.
const LIQUIDITY_SHIFT: u32 = 16;

fn checked_shl(value: U256, bits: u32) -> Result<U256> {
    if value.leading_zeros() < bits {
        return Err(CreditError::ArithmeticOverflow);
    }
    Ok(value << bits as usize)
}

// Montants dus par l'utilisateur : arrondis vers le haut.
fn interest_owed(duration: u64, y: U256) -> Result<U256> {
    Ok(shift_right_up(checked_mul(U256::from(duration), y)?, INTEREST_SHIFT))
}

fn collateral_owed(duration: u64, z: U256) -> Result<U256> {
    Ok(shift_right_up(checked_mul(U256::from(duration), z)?, COLLATERAL_SHIFT))
}

// Montants reçus par l'utilisateur : tronqués.
fn interest_earned(duration: u64, y: U256) -> Result<U256> {
    Ok(checked_mul(U256::from(duration), y)? >> INTEREST_SHIFT as usize)
}

fn coverage_earned(duration: u64, z: U256) -> Result<U256> {
    Ok(checked_mul(U256::from(duration), z)? >> COLLATERAL_SHIFT as usize)
}

fn require_non_zero(value: U256, name: &'static str) -> Result<()> {
    if value.is_zero() {
        return Err(CreditError::ZeroAmount(name));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOutcome {
    pub liquidity_out: U256,
    pub due_out: Due,
    pub fee_stored_increase: U256,
    pub state: ConstantProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnOutcome {
    pub asset_out: U256,
    pub collateral_out: U256,
    pub fee_out: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendOutcome {
    pub claims_out: Claims,
    pub fee: U256,
    pub state: ConstantProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowOutcome {
    pub asset_out: U256,
    pub due_out: Due,
    pub fee: U256,
    pub state: ConstantProduct,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub asset_out: U256,
    pub collateral_out: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepayOutcome {
    pub collateral_out: U256,
    pub due: Due,
}

/// Incréments de réserves pour un apport de liquidité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintDelta {
    pub x_increase: U256,
    pub y_increase: U256,
    pub z_increase: U256,
}

/// Apport de liquidité. Le premier dépôt fixe le taux de change à `x << 16`,
/// les suivants reçoivent le minimum des parts implicites en y et en z.
pub fn mint(
    pool: &PoolConfig,
    state: &ConstantProduct,
    total_liquidity: U256,
    fee_stored: U256,
    delta: &MintDelta,
    now: u64,
) -> Result<MintOutcome> {
    let duration = pool.duration(now)?;
    require_non_zero(delta.x_increase, "x_increase")?;
    require_non_zero(delta.y_increase, "y_increase")?;
    require_non_zero(delta.z_increase, "z_increase")?;

    let (liquidity_out, fee_stored_increase) = if total_liquidity.is_zero() {
        (checked_shl(delta.x_increase, LIQUIDITY_SHIFT)?, U256::zero())
    } else {
        let from_x = mul_div(total_liquidity, delta.x_increase, state.x)?;
        let from_y = mul_div(total_liquidity, delta.y_increase, state.y)?;
        let from_z = mul_div(total_liquidity, delta.z_increase, state.z)?;
        if from_y > from_x {
            return Err(CreditError::InvariantViolation("interest share above asset share"));
        }
        if from_z > from_x {
            return Err(CreditError::InvariantViolation("collateral share above asset share"));
        }
        let liquidity_out = from_y.min(from_z);
        (liquidity_out, mul_div_up(fee_stored, liquidity_out, total_liquidity)?)
    };
    require_non_zero(liquidity_out, "liquidity_out")?;

    let due_out = Due {
        debt: checked_add(interest_owed(duration, delta.y_increase)?, delta.x_increase)?,
        collateral: checked_add(collateral_owed(duration, delta.z_increase)?, delta.z_increase)?,
    };
    let state = ConstantProduct::new(
        checked_add(state.x, delta.x_increase)?,
        checked_add(state.y, delta.y_increase)?,
        checked_add(state.z, delta.z_increase)?,
    );
    Ok(MintOutcome { liquidity_out, due_out, fee_stored_increase, state })
}

/// Inverse de la dette de `mint` pour un pool vide : la `Due` produite
/// ne dépasse jamais les montants demandés.
pub fn new_liquidity_deltas(
    pool: &PoolConfig,
    asset_in: U256,
    debt_in: U256,
    collateral_in: U256,
    now: u64,
) -> Result<MintDelta> {
    let duration = pool.duration(now)?;
    require_non_zero(asset_in, "asset_in")?;
    require_non_zero(collateral_in, "collateral_in")?;
    if debt_in <= asset_in {
        return Err(CreditError::ZeroAmount("interest (debt_in - asset_in)"));
    }
    let y_increase = checked_shl(debt_in - asset_in, INTEREST_SHIFT)? / U256::from(duration);
    let denominator = checked_add(U256::from(duration), U256::one() << COLLATERAL_SHIFT as usize)?;
    let z_increase = checked_shl(collateral_in, COLLATERAL_SHIFT)? / denominator;
    require_non_zero(y_increase, "y_increase")?;
    require_non_zero(z_increase, "z_increase")?;
    Ok(MintDelta { x_increase: asset_in, y_increase, z_increase })
}

/// Retrait de liquidité. Les prêteurs sont servis avant les LP : en déficit,
/// les LP ne touchent plus d'actif et leur collatéral est amputé de la couverture due.
pub fn burn(
    total_liquidity: U256,
    fee_stored: U256,
    reserves: &Reserves,
    total_claims: &Claims,
    liquidity_in: U256,
) -> Result<BurnOutcome> {
    require_non_zero(liquidity_in, "liquidity_in")?;
    if liquidity_in > total_liquidity {
        return Err(CreditError::InsufficientLiquidity);
    }

    let total_bond = total_claims.total_loan()?;
    let (asset_out, collateral_out) = if reserves.asset >= total_bond {
        (
            mul_div(reserves.asset - total_bond, liquidity_in, total_liquidity)?,
            mul_div(reserves.collateral, liquidity_in, total_liquidity)?,
        )
    } else {
        let deficit = total_bond - reserves.asset;
        let total_insurance = total_claims.total_coverage()?;
        if wide_mul(reserves.collateral, total_bond) > wide_mul(deficit, total_insurance) {
            let owed = mul_div_up(deficit, total_insurance, total_bond)?;
            let remaining = reserves.collateral - owed;
            (U256::zero(), mul_div(remaining, liquidity_in, total_liquidity)?)
        } else {
            (U256::zero(), U256::zero())
        }
    };
    let fee_out = mul_div(fee_stored, liquidity_in, total_liquidity)?;
    Ok(BurnOutcome { asset_out, collateral_out, fee_out })
}

/// Prêt : l'appelant fournit des deltas cohérents (interpolateur), pas de
/// vérification d'invariant ici.
pub fn lend(
    pool: &PoolConfig,
    state: &ConstantProduct,
    x_increase: U256,
    y_decrease: U256,
    z_decrease: U256,
    now: u64,
) -> Result<LendOutcome> {
    let duration = pool.duration(now)?;
    require_non_zero(x_increase, "x_increase")?;

    let x_reserve = checked_add(state.x, x_increase)?;
    let claims_out = Claims {
        loan_principal: x_increase,
        loan_interest: interest_earned(duration, y_decrease)?,
        coverage_principal: mul_div(state.z, x_increase, x_reserve)?,
        coverage_interest: coverage_earned(duration, z_decrease)?,
    };
    let fee = lend_fee(pool, x_increase, now)?;
    let state = ConstantProduct::new(
        x_reserve,
        checked_sub(state.y, y_decrease)?,
        checked_sub(state.z, z_decrease)?,
    );
    Ok(LendOutcome { claims_out, fee, state })
}

/// Rejette toute transition qui ferait baisser `x * y * z`.
pub fn check_constant_product(before: &ConstantProduct, after: &ConstantProduct) -> Result<()> {
    if after.product() < before.product() {
        return Err(CreditError::InvariantViolation("constant product decreased"));
    }
    Ok(())
}

/// Contrôle préalable à tout emprunt : produit non décroissant, puis bande
/// `[yMax / 16, yMax]` pour y et plafond `zMax` pour z.
pub fn check_borrow(state: &ConstantProduct, x_decrease: U256, y_increase: U256, z_increase: U256) -> Result<()> {
    if x_decrease >= state.x {
        return Err(CreditError::InvariantViolation("borrow exhausts the asset reserve"));
    }
    let x_reserve = state.x - x_decrease;
    let next = ConstantProduct::new(
        x_reserve,
        checked_add(state.y, y_increase)?,
        checked_add(state.z, z_increase)?,
    );
    check_constant_product(state, &next)?;

    let y_max = mul_div_up(x_decrease, state.y, x_reserve)?;
    if y_increase > y_max {
        return Err(CreditError::RateBoundExceeded("interest"));
    }
    let z_max = mul_div_up(x_decrease, state.z, x_reserve)?;
    if z_increase > z_max {
        return Err(CreditError::RateBoundExceeded("collateral"));
    }
    let y_min = shift_right_up(y_max, 4);
    if y_increase < y_min {
        return Err(CreditError::RateBoundTooLow("interest"));
    }
    Ok(())
}

/// Emprunt de `x_decrease` : dette et collatéral arrondis contre l'emprunteur,
/// frais retenus sur le montant versé.
pub fn borrow(
    pool: &PoolConfig,
    state: &ConstantProduct,
    x_decrease: U256,
    y_increase: U256,
    z_increase: U256,
    now: u64,
) -> Result<BorrowOutcome> {
    let duration = pool.duration(now)?;
    require_non_zero(x_decrease, "x_decrease")?;
    check_borrow(state, x_decrease, y_increase, z_increase)?;

    let x_reserve = state.x - x_decrease;
    let debt = checked_add(interest_owed(duration, y_increase)?, x_decrease)?;
    let minimum_collateral = mul_div_up(state.z, x_decrease, x_reserve)?;
    let collateral = collateral_owed(duration, z_increase)?.max(minimum_collateral);
    let fee = borrow_fee(pool, x_decrease, now)?;
    let asset_out = checked_sub(x_decrease, fee)?;

    debug!(%x_decrease, %debt, %collateral, %fee, "borrow priced");

    let state = ConstantProduct::new(
        x_reserve,
        checked_add(state.y, y_increase)?,
        checked_add(state.z, z_increase)?,
    );
    Ok(BorrowOutcome { asset_out, due_out: Due { debt, collateral }, fee, state })
}

/// Règlement d'une créance après maturité. L'actif paie d'abord le principal,
/// puis les intérêts. Un déficit est couvert en collatéral : couverture totale,
/// sinon principal de couverture puis intérêts au prorata, sinon principal seul au prorata.
pub fn withdraw(
    pool: &PoolConfig,
    reserves: &Reserves,
    total_claims: &Claims,
    claims_in: &Claims,
    now: u64,
) -> Result<WithdrawOutcome> {
    pool.ensure_matured(now)?;
    if claims_in.is_zero() {
        return Err(CreditError::ZeroAmount("claims_in"));
    }

    let total_loan = total_claims.total_loan()?;
    if reserves.asset >= total_loan {
        return Ok(WithdrawOutcome { asset_out: claims_in.total_loan()?, collateral_out: U256::zero() });
    }

    let asset_out = if reserves.asset >= total_claims.loan_principal {
        let remaining = reserves.asset - total_claims.loan_principal;
        checked_add(
            mul_div(claims_in.loan_interest, remaining, total_claims.loan_interest)?,
            claims_in.loan_principal,
        )?
    } else {
        mul_div(claims_in.loan_principal, reserves.asset, total_claims.loan_principal)?
    };

    let deficit = total_loan - reserves.asset;
    let covered_principal = checked_mul(total_claims.coverage_principal, deficit)?;
    let covered_interest = checked_mul(total_claims.coverage_interest, deficit)?;
    let collateral_value = checked_mul(reserves.collateral, total_loan)?;

    let collateral_out = if collateral_value >= checked_add(covered_principal, covered_interest)? {
        mul_div(claims_in.total_coverage()?, deficit, total_loan)?
    } else if collateral_value >= covered_principal {
        let remaining = collateral_value - covered_principal;
        checked_add(
            mul_div(
                claims_in.coverage_interest,
                remaining,
                checked_mul(total_claims.coverage_interest, total_loan)?,
            )?,
            mul_div(claims_in.coverage_principal, deficit, total_loan)?,
        )?
    } else {
        mul_div(claims_in.coverage_principal, reserves.collateral, total_claims.coverage_principal)?
    };

    Ok(WithdrawOutcome { asset_out, collateral_out })
}

/// Remboursement partiel ou total avant maturité ; libère le collatéral au prorata.
pub fn repay(pool: &PoolConfig, due: &Due, asset_in: U256, now: u64) -> Result<RepayOutcome> {
    pool.duration(now)?;
    require_non_zero(asset_in, "asset_in")?;
    if asset_in > due.debt {
        return Err(CreditError::ExcessRepayment);
    }
    let collateral_out = mul_div(due.collateral, asset_in, due.debt)?;
    Ok(RepayOutcome {
        collateral_out,
        due: Due { debt: due.debt - asset_in, collateral: due.collateral - collateral_out },
    })
}
