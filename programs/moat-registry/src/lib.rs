use anchor_lang::prelude::*;

declare_id!("7xrqC43sgnJAc1ozxGsXQBv8Jhw1K3GvhoXiT8F6R84i");

#[program]
pub mod moat_registry {
    use super::*;

    /// Commit a batch: stores `(merkle_root, memo_hash, kind)` for
    /// `(creator, batch_id)`.
    ///
    /// The commitment PDA is created with `init`, so a second commit for the
    /// same pair fails in the system program ("already in use") and the
    /// first record is never touched.
    pub fn commit_batch(
        ctx: Context<CommitBatchCtx>,
        batch_id: u64,
        kind: u8,
        merkle_root: [u8; 32],
        memo_hash: [u8; 32],
    ) -> Result<()> {
        let commitment = &mut ctx.accounts.commitment;
        let clock = Clock::get()?;

        commitment.creator = ctx.accounts.creator.key();
        commitment.batch_id = batch_id;
        commitment.kind = kind;
        commitment.merkle_root = merkle_root;
        commitment.memo_hash = memo_hash;
        commitment.created_at = clock.unix_timestamp;
        commitment.bump = ctx.bumps.commitment;

        emit!(BatchCommitted {
            creator: commitment.creator,
            batch_id,
            kind,
            merkle_root,
            memo_hash,
            created_at: commitment.created_at,
        });

        Ok(())
    }

    /// Create the directory singleton. The signer becomes its admin.
    pub fn initialize_registry(ctx: Context<InitializeRegistryCtx>) -> Result<()> {
        let state = &mut ctx.accounts.registry_state;
        state.admin = ctx.accounts.admin.key();
        state.next_id = 0;
        state.bump = ctx.bumps.registry_state;

        emit!(RegistryInitialized { admin: state.admin });
        Ok(())
    }

    /// Catalog a target program under the next sequential id (admin only).
    pub fn register_entry(
        ctx: Context<RegisterEntryCtx>,
        target_program: Pubkey,
        kind: u8,
    ) -> Result<()> {
        let state = &mut ctx.accounts.registry_state;
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or(RegistryError::CounterOverflow)?;

        let entry = &mut ctx.accounts.entry;
        entry.registry = state.key();
        entry.id = id;
        entry.admin = state.admin;
        entry.target_program = target_program;
        entry.kind = kind;
        entry.bump = ctx.bumps.entry;

        emit!(EntryRegistered {
            id,
            target_program,
            kind,
        });
        Ok(())
    }
}

// ============================================================================
// Accounts (Context structs)
// ============================================================================

#[derive(Accounts)]
#[instruction(batch_id: u64)]
pub struct CommitBatchCtx<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        init,
        payer = creator,
        space = 8 + BatchCommitment::INIT_SPACE,
        seeds = [b"batch", creator.key().as_ref(), batch_id.to_le_bytes().as_ref()],
        bump,
    )]
    pub commitment: Account<'info, BatchCommitment>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitializeRegistryCtx<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        init,
        payer = admin,
        space = 8 + RegistryState::INIT_SPACE,
        seeds = [b"registry"],
        bump,
    )]
    pub registry_state: Account<'info, RegistryState>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RegisterEntryCtx<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry_state.bump,
        has_one = admin @ RegistryError::Unauthorized,
    )]
    pub registry_state: Account<'info, RegistryState>,

    #[account(
        init,
        payer = admin,
        space = 8 + RegistryEntry::INIT_SPACE,
        seeds = [
            b"entry",
            registry_state.key().as_ref(),
            registry_state.next_id.to_le_bytes().as_ref(),
        ],
        bump,
    )]
    pub entry: Account<'info, RegistryEntry>,

    pub system_program: Program<'info, System>,
}

// ============================================================================
// Account Data
// ============================================================================

/// Field order is the byte layout decoded by `moat-registry`'s `accounts` module.
#[account]
#[derive(InitSpace)]
pub struct BatchCommitment {
    pub creator: Pubkey,
    pub batch_id: u64,
    pub kind: u8,
    pub merkle_root: [u8; 32],
    pub memo_hash: [u8; 32],
    /// Cluster time at commit (unix timestamp)
    pub created_at: i64,
    pub bump: u8,
}

#[account]
#[derive(InitSpace)]
pub struct RegistryState {
    pub admin: Pubkey,
    /// Id assigned to the next registered entry
    pub next_id: u32,
    pub bump: u8,
}

#[account]
#[derive(InitSpace)]
pub struct RegistryEntry {
    pub registry: Pubkey,
    pub id: u32,
    pub admin: Pubkey,
    pub target_program: Pubkey,
    pub kind: u8,
    pub bump: u8,
}

// ============================================================================
// Events
// ============================================================================

#[event]
pub struct BatchCommitted {
    pub creator: Pubkey,
    pub batch_id: u64,
    pub kind: u8,
    pub merkle_root: [u8; 32],
    pub memo_hash: [u8; 32],
    pub created_at: i64,
}

#[event]
pub struct RegistryInitialized {
    pub admin: Pubkey,
}

#[event]
pub struct EntryRegistered {
    pub id: u32,
    pub target_program: Pubkey,
    pub kind: u8,
}

// ============================================================================
// Errors
// ============================================================================

#[error_code]
pub enum RegistryError {
    #[msg("Signer is not the registry admin")]
    Unauthorized,
    #[msg("Registry entry counter overflow")]
    CounterOverflow,
}
