use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::command::Rejection;
use crate::config::{Cost, RulesConfig};
use crate::deposit::{DepositId, ResourceDeposit, ResourceKind};
use crate::events::GameEvent;
use crate::grid::GridPos;
use crate::tile::PlayerId;
use crate::turn::{RoundContext, RoundSystem};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub gold: u32,
    pub coal: u32,
    pub gold_income: u32,
    pub coal_income: u32,
}

impl Wallet {
    pub fn covers(&self, cost: Cost) -> bool {
        self.gold >= cost.gold && self.coal >= cost.coal
    }

    pub fn income(&self) -> Cost {
        Cost::new(self.gold_income, self.coal_income)
    }
}

/// One wallet per player. Nothing outside this type mutates a wallet.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    wallets: BTreeMap<PlayerId, Wallet>,
}

impl Ledger {
    pub(crate) fn open(&mut self, player: PlayerId, gold: u32, coal: u32) {
        self.wallets.insert(
            player,
            Wallet {
                gold,
                coal,
                ..Wallet::default()
            },
        );
    }

    pub fn wallet(&self, player: PlayerId) -> Option<&Wallet> {
        self.wallets.get(&player)
    }

    pub fn wallets(&self) -> impl Iterator<Item = (PlayerId, &Wallet)> {
        self.wallets.iter().map(|(player, wallet)| (*player, wallet))
    }

    pub fn can_afford(&self, player: PlayerId, cost: Cost) -> bool {
        self.wallet(player).is_some_and(|wallet| wallet.covers(cost))
    }

    /// All-or-nothing: either both resources are deducted or neither is.
    pub(crate) fn try_spend(&mut self, player: PlayerId, cost: Cost) -> Result<Wallet, Rejection> {
        let wallet = self
            .wallets
            .get_mut(&player)
            .ok_or(Rejection::UnknownPlayer { player })?;
        if !wallet.covers(cost) {
            return Err(Rejection::InsufficientFunds {
                gold: cost.gold,
                coal: cost.coal,
            });
        }
        wallet.gold -= cost.gold;
        wallet.coal -= cost.coal;
        Ok(*wallet)
    }

    pub(crate) fn grant(&mut self, player: PlayerId, amount: Cost) -> Result<Wallet, Rejection> {
        let wallet = self
            .wallets
            .get_mut(&player)
            .ok_or(Rejection::UnknownPlayer { player })?;
        wallet.gold = wallet.gold.saturating_add(amount.gold);
        wallet.coal = wallet.coal.saturating_add(amount.coal);
        Ok(*wallet)
    }

    pub(crate) fn set_income(&mut self, player: PlayerId, income: Cost) -> Option<Wallet> {
        let wallet = self.wallets.get_mut(&player)?;
        wallet.gold_income = income.gold;
        wallet.coal_income = income.coal;
        Some(*wallet)
    }

    /// Adds the cached income once. Returns the amount added.
    pub(crate) fn apply_income(&mut self, player: PlayerId) -> Option<(Cost, Wallet)> {
        let wallet = self.wallets.get_mut(&player)?;
        let income = wallet.income();
        wallet.gold = wallet.gold.saturating_add(income.gold);
        wallet.coal = wallet.coal.saturating_add(income.coal);
        Some((income, *wallet))
    }
}

/// Per-deposit yield, as shown next to each deposit when income lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositIncome {
    pub deposit: DepositId,
    pub at: GridPos,
    pub kind: ResourceKind,
    pub amount: u32,
}

pub fn deposit_income(world: &World, rules: &RulesConfig, deposit: &ResourceDeposit) -> u32 {
    let Some(tile) = world.tile_by_id(deposit.tile()) else {
        return 0;
    };
    rules
        .economy
        .income
        .yield_for(tile.terrain(), deposit.has_mine())
}

/// Deposits whose tile belongs to `player`, with their yields.
pub fn income_breakdown(world: &World, rules: &RulesConfig, player: PlayerId) -> Vec<DepositIncome> {
    world
        .deposits()
        .filter(|deposit| {
            world
                .tile_by_id(deposit.tile())
                .and_then(|tile| tile.owner())
                == Some(player)
        })
        .map(|deposit| DepositIncome {
            deposit: deposit.id(),
            at: deposit.pos(),
            kind: deposit.kind(),
            amount: deposit_income(world, rules, deposit),
        })
        .collect()
}

/// Income `player` would receive right now. The fallback only applies to
/// worlds without any deposits, never to a player who simply owns none.
pub fn compute_income(world: &World, rules: &RulesConfig, player: PlayerId) -> Cost {
    if !world.has_any_deposits() {
        return rules.economy.fallback_income;
    }
    income_breakdown(world, rules, player)
        .into_iter()
        .fold(Cost::default(), |mut total, entry| {
            match entry.kind {
                ResourceKind::Gold => total.gold = total.gold.saturating_add(entry.amount),
                ResourceKind::Coal => total.coal = total.coal.saturating_add(entry.amount),
            }
            total
        })
}

fn wallet_changed(player: PlayerId, wallet: &Wallet) -> GameEvent {
    GameEvent::WalletChanged {
        player,
        gold: wallet.gold,
        coal: wallet.coal,
        gold_income: wallet.gold_income,
        coal_income: wallet.coal_income,
    }
}

pub(crate) fn spend(world: &mut World, player: PlayerId, cost: Cost) -> Result<(), Rejection> {
    let wallet = world.ledger.try_spend(player, cost)?;
    world.emit(wallet_changed(player, &wallet));
    Ok(())
}

pub(crate) fn grant(world: &mut World, player: PlayerId, amount: Cost) -> Result<(), Rejection> {
    let wallet = world.ledger.grant(player, amount)?;
    world.emit(wallet_changed(player, &wallet));
    Ok(())
}

pub(crate) fn recalculate_income(world: &mut World, rules: &RulesConfig, player: PlayerId) -> Cost {
    let income = compute_income(world, rules, player);
    if let Some(wallet) = world.ledger.set_income(player, income) {
        world.emit(wallet_changed(player, &wallet));
    }
    income
}

pub(crate) fn apply_turn_income(world: &mut World, rules: &RulesConfig, player: PlayerId) -> Cost {
    let breakdown = income_breakdown(world, rules, player);
    let Some((income, wallet)) = world.ledger.apply_income(player) else {
        tracing::error!(%player, "applying income to a player without a wallet");
        return Cost::default();
    };
    for entry in breakdown {
        world.emit(GameEvent::IncomeApplied {
            player,
            at: entry.at,
            kind: entry.kind,
            amount: entry.amount,
        });
    }
    world.emit(wallet_changed(player, &wallet));
    income
}

/// Credits every active player's income once per completed round.
pub struct IncomeSystem;

impl IncomeSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IncomeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundSystem for IncomeSystem {
    fn name(&self) -> &str {
        "income"
    }

    fn run(&mut self, ctx: &RoundContext, world: &mut World) -> Result<()> {
        for &player in ctx.players {
            recalculate_income(world, ctx.rules, player);
            let income = apply_turn_income(world, ctx.rules, player);
            tracing::debug!(
                turn = ctx.turn,
                %player,
                gold = income.gold,
                coal = income.coal,
                "income applied"
            );
        }
        Ok(())
    }
}
