//! Rendering helpers shared by the command modules

use tidepool::{Event, TokenKind, ONE};

/// Formats an 18-decimal fixed-point value with six fractional digits,
/// which is as much as the CLI's amounts ever carry.
pub fn fixed(value: u128) -> String {
    let whole = value / ONE;
    let frac = (value % ONE) / (ONE / 1_000_000);
    format!("{}.{:06}", whole, frac)
}

pub fn token_name(kind: TokenKind) -> String {
    match kind {
        TokenKind::Underlying => "underlying".to_string(),
        TokenKind::Wrapped => "wrapped".to_string(),
        TokenKind::YieldBearing(m) => format!("yb[{}]", m),
        TokenKind::Protection(m) => format!("dp[{}]", m),
        TokenKind::PoolShare(m) => format!("lp[{}]", m),
    }
}

/// One human line per event, in the order the engine recorded them.
pub fn event_line(event: &Event) -> String {
    match event {
        Event::Transfer {
            token,
            from,
            to,
            amount,
        } => format!("transfer {} {} {} -> {}", token_name(*token), amount, from, to),
        Event::TransferShares { from, to, shares } => {
            format!("transfer-shares {} {} -> {}", shares, from, to)
        }
        Event::Approval {
            owner,
            spender,
            amount,
        } => format!("approval {} allows {} up to {}", owner, spender, amount),
        Event::Deposited {
            account,
            value,
            shares,
        } => format!("deposited {} by {} (minted {} shares)", value, account, shares),
        Event::Withdrawn {
            account,
            value,
            shares,
        } => format!("withdrawn {} by {} (burned {} shares)", value, account, shares),
        Event::Rebased { delta, new_value } => {
            format!("rebased {:+} (pool value now {})", delta, new_value)
        }
        Event::MarketCreated {
            market,
            maturity,
            reference_rate,
        } => format!(
            "market {} created, matures at {}, reference rate {}",
            market,
            maturity,
            fixed(*reference_rate)
        ),
        Event::DepegResolved {
            market,
            realized_ratio,
        } => format!(
            "market {} resolved, realized ratio {}",
            market,
            fixed(*realized_ratio)
        ),
        Event::Swapped {
            market,
            asset_in,
            asset_out,
            amount_in,
            amount_out,
            fee,
        } => format!(
            "market {} swap {} asset{} -> {} asset{} (fee {})",
            market, amount_in, asset_in, amount_out, asset_out, fee
        ),
        Event::LiquidityAdded {
            market,
            amounts,
            shares,
        } => format!(
            "market {} liquidity added [{}, {}] (minted {} shares)",
            market, amounts[0], amounts[1], shares
        ),
        Event::LiquidityRemoved {
            market,
            amounts,
            shares,
        } => format!(
            "market {} liquidity removed [{}, {}] (burned {} shares)",
            market, amounts[0], amounts[1], shares
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool::AccountId;

    #[test]
    fn test_fixed_formats_whole_and_fraction() {
        assert_eq!(fixed(ONE), "1.000000");
        assert_eq!(fixed(ONE / 2), "0.500000");
        assert_eq!(fixed(3 * ONE / 2), "1.500000");
        assert_eq!(fixed(0), "0.000000");
        // sub-ppm detail is truncated, not rounded
        assert_eq!(fixed(ONE + 1), "1.000000");
    }

    #[test]
    fn test_event_lines_name_the_accounts() {
        let line = event_line(&Event::Deposited {
            account: AccountId::named("alice"),
            value: 100,
            shares: 100,
        });
        assert_eq!(line, "deposited 100 by alice (minted 100 shares)");
    }

    #[test]
    fn test_token_names_carry_the_market_index() {
        assert_eq!(token_name(TokenKind::YieldBearing(3)), "yb[3]");
        assert_eq!(token_name(TokenKind::PoolShare(0)), "lp[0]");
    }
}
