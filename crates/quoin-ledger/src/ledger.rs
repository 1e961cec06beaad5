//! Supply/Holder arena and the controller-gated mutation operations.
//!
//! Registries and cells live in fixed arenas and are addressed by copyable
//! handles ([`SupplyId`], [`HolderId`]) issued at creation. Cells are bound
//! to exactly one registry for their whole lifetime; only their `amount`
//! and `controller` fields ever change.
//!
//! ## Conservation invariant
//!
//! ```text
//! supply.total == sum(holder.amount for holder in registry)
//! ```
//!
//! holds after every operation: `mint`/`burn` adjust cell and total
//! together, `send_to` moves value without touching the total.
//!
//! ## Authorization
//!
//! Each operation names its caller explicitly and checks it against the
//! designated controller before the first write. A cell created without a
//! controller is inert: no mutating operation succeeds on it until the
//! registry controller assigns one.

use serde::{Deserialize, Serialize};

use quoin_types::{Account, Amount};

use crate::audit::{AuditOp, AuditRecord};
use crate::{LedgerError, Result};

/// Handle to a value registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SupplyId(pub(crate) u32);

/// Handle to a per-account value cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HolderId(pub(crate) u32);

/// A value registry tracking a single non-negative total.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Supply {
    total: Amount,
    controller: Account,
}

impl Supply {
    /// The registry total.
    pub fn total(&self) -> Amount {
        self.total
    }

    /// The account allowed to mint/burn in this registry.
    pub fn controller(&self) -> Account {
        self.controller
    }
}

/// A per-account value cell, bound to exactly one registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Holder {
    registry: SupplyId,
    amount: Amount,
    controller: Option<Account>,
}

impl Holder {
    /// The registry this cell is bound to. Immutable after creation.
    pub fn registry(&self) -> SupplyId {
        self.registry
    }

    /// The cell's current balance.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The cell's controller, or `None` for an unowned (inert) cell.
    pub fn controller(&self) -> Option<Account> {
        self.controller
    }
}

/// The value ledger: registries, cells, and the append-only audit log.
#[derive(Debug, Default)]
pub struct Ledger {
    supplies: Vec<Supply>,
    holders: Vec<Holder>,
    audit: Vec<AuditRecord>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new registry with the given controller.
    pub fn create_supply(&mut self, controller: Account) -> SupplyId {
        let id = SupplyId(self.supplies.len() as u32);
        self.supplies.push(Supply {
            total: 0,
            controller,
        });
        tracing::debug!(supply = id.0, controller = %hex::encode(controller), "registry created");
        id
    }

    /// Create a new cell bound to `registry`.
    ///
    /// A cell created with `controller = None` is inert until the registry
    /// controller assigns one via [`Ledger::set_controller`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownSupply`] if the registry handle is unknown
    pub fn create_holder(
        &mut self,
        registry: SupplyId,
        controller: Option<Account>,
    ) -> Result<HolderId> {
        self.supply(registry)?;
        let id = HolderId(self.holders.len() as u32);
        self.holders.push(Holder {
            registry,
            amount: 0,
            controller,
        });
        tracing::debug!(holder = id.0, supply = registry.0, "cell created");
        Ok(id)
    }

    /// Create fresh value into a cell, increasing the registry total.
    ///
    /// Restricted to the registry controller.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` does not control the registry
    /// - [`LedgerError::OutOfBounds`] if the cell or total would overflow
    pub fn mint(&mut self, caller: Account, holder: HolderId, amount: Amount) -> Result<()> {
        let cell = self.holder(holder)?;
        let registry = cell.registry;
        let supply = self.supply(registry)?;
        if supply.controller != caller {
            return Err(LedgerError::Unauthorized);
        }
        let new_amount = cell.amount.checked_add(amount).ok_or(LedgerError::OutOfBounds)?;
        let new_total = supply.total.checked_add(amount).ok_or(LedgerError::OutOfBounds)?;

        self.holders[holder.0 as usize].amount = new_amount;
        self.supplies[registry.0 as usize].total = new_total;

        tracing::debug!(holder = holder.0, amount, new_total, "mint");
        self.record(AuditOp::Mint { holder, amount }, new_amount, new_total);
        Ok(())
    }

    /// Destroy value from a cell, decreasing the registry total.
    ///
    /// Restricted to the registry controller.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` does not control the registry
    /// - [`LedgerError::InsufficientBalance`] if `amount` exceeds the cell balance
    pub fn burn(&mut self, caller: Account, holder: HolderId, amount: Amount) -> Result<()> {
        let cell = self.holder(holder)?;
        let registry = cell.registry;
        let supply = self.supply(registry)?;
        if supply.controller != caller {
            return Err(LedgerError::Unauthorized);
        }
        if amount > cell.amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: cell.amount,
            });
        }
        // The conservation invariant guarantees total >= cell.amount >= amount.
        let new_amount = cell.amount - amount;
        let new_total = supply.total.checked_sub(amount).ok_or(LedgerError::OutOfBounds)?;

        self.holders[holder.0 as usize].amount = new_amount;
        self.supplies[registry.0 as usize].total = new_total;

        tracing::debug!(holder = holder.0, amount, new_total, "burn");
        self.record(AuditOp::Burn { holder, amount }, new_amount, new_total);
        Ok(())
    }

    /// Move value from `src` to `dst` within one registry. The registry
    /// total is unchanged.
    ///
    /// Restricted to the source cell's controller.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SelfTransfer`] if `src == dst`
    /// - [`LedgerError::RegistryMismatch`] if the cells belong to different registries
    /// - [`LedgerError::Unauthorized`] if `caller` does not control `src`
    /// - [`LedgerError::InsufficientBalance`] if `amount` exceeds the source balance
    pub fn send_to(
        &mut self,
        caller: Account,
        dst: HolderId,
        src: HolderId,
        amount: Amount,
    ) -> Result<()> {
        if src == dst {
            return Err(LedgerError::SelfTransfer);
        }
        let src_cell = self.holder(src)?;
        let dst_cell = self.holder(dst)?;
        if src_cell.registry != dst_cell.registry {
            return Err(LedgerError::RegistryMismatch);
        }
        if src_cell.controller != Some(caller) {
            return Err(LedgerError::Unauthorized);
        }
        if amount > src_cell.amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: src_cell.amount,
            });
        }
        let new_dst = dst_cell.amount.checked_add(amount).ok_or(LedgerError::OutOfBounds)?;
        let new_src = src_cell.amount - amount;
        let total = self.supplies[src_cell.registry.0 as usize].total;

        self.holders[src.0 as usize].amount = new_src;
        self.holders[dst.0 as usize].amount = new_dst;

        tracing::debug!(src = src.0, dst = dst.0, amount, "transfer");
        self.record(AuditOp::Transfer { src, dst, amount }, new_src, total);
        Ok(())
    }

    /// Reassign a cell's controller.
    ///
    /// Allowed for the cell's current controller, or for the registry
    /// controller when the cell is unowned (this is how inert cells become
    /// usable).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` may not reassign the cell
    pub fn set_controller(
        &mut self,
        caller: Account,
        holder: HolderId,
        new_controller: Account,
    ) -> Result<()> {
        let cell = self.holder(holder)?;
        let registry = cell.registry;
        let authorized = match cell.controller {
            Some(current) => current == caller,
            None => self.supply(registry)?.controller == caller,
        };
        if !authorized {
            return Err(LedgerError::Unauthorized);
        }
        let amount = cell.amount;
        let total = self.supplies[registry.0 as usize].total;
        self.holders[holder.0 as usize].controller = Some(new_controller);

        tracing::debug!(
            holder = holder.0,
            new_controller = %hex::encode(new_controller),
            "cell controller reassigned"
        );
        self.record(
            AuditOp::SetController {
                holder,
                new_controller,
            },
            amount,
            total,
        );
        Ok(())
    }

    /// Reassign a registry's controller.
    ///
    /// Restricted to the registry's current controller.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` does not control the registry
    pub fn delegate_registry_controller(
        &mut self,
        caller: Account,
        registry: SupplyId,
        new_controller: Account,
    ) -> Result<()> {
        let supply = self.supply(registry)?;
        if supply.controller != caller {
            return Err(LedgerError::Unauthorized);
        }
        let total = supply.total;
        self.supplies[registry.0 as usize].controller = new_controller;

        tracing::info!(
            supply = registry.0,
            new_controller = %hex::encode(new_controller),
            "registry controller reassigned"
        );
        self.record(
            AuditOp::DelegateRegistry {
                registry,
                new_controller,
            },
            0,
            total,
        );
        Ok(())
    }

    /// The cell's current balance.
    pub fn amount_of(&self, holder: HolderId) -> Result<Amount> {
        Ok(self.holder(holder)?.amount)
    }

    /// The registry's current total.
    pub fn total_of(&self, registry: SupplyId) -> Result<Amount> {
        Ok(self.supply(registry)?.total)
    }

    /// The cell's current controller (`None` for an unowned cell).
    pub fn controller_of(&self, holder: HolderId) -> Result<Option<Account>> {
        Ok(self.holder(holder)?.controller)
    }

    /// The registry a cell is bound to.
    pub fn registry_of(&self, holder: HolderId) -> Result<SupplyId> {
        Ok(self.holder(holder)?.registry)
    }

    /// The append-only audit log, in operation order.
    pub fn audit_log(&self) -> &[AuditRecord] {
        &self.audit
    }

    fn supply(&self, id: SupplyId) -> Result<&Supply> {
        self.supplies
            .get(id.0 as usize)
            .ok_or(LedgerError::UnknownSupply)
    }

    fn holder(&self, id: HolderId) -> Result<&Holder> {
        self.holders
            .get(id.0 as usize)
            .ok_or(LedgerError::UnknownHolder)
    }

    fn record(&mut self, op: AuditOp, resulting_amount: Amount, resulting_total: Amount) {
        let seq = self.audit.len() as u64;
        self.audit.push(AuditRecord {
            seq,
            op,
            resulting_amount,
            resulting_total,
        });
    }
}
