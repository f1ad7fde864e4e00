use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_sdk::hash::Hash;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

use super::{ChainConnection, ChainError, ConfirmationStrategy};
use crate::wallet::WalletProvider;

/// One payout leg of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub destination: String,
    /// Amount in SOL.
    pub amount: Decimal,
}

/// Converts SOL to lamports, rounding down.
pub fn sol_to_lamports(amount: Decimal) -> Result<u64, ChainError> {
    if amount.is_sign_negative() {
        return Err(ChainError::InvalidAmount(amount.to_string()));
    }
    (amount * Decimal::from(LAMPORTS_PER_SOL))
        .floor()
        .to_u64()
        .ok_or_else(|| ChainError::InvalidAmount(amount.to_string()))
}

/// Pays a batch of recipients from the operator wallet in one transaction.
pub struct TransferExecutor {
    connection: Arc<dyn ChainConnection>,
}

impl TransferExecutor {
    pub fn new(connection: Arc<dyn ChainConnection>) -> Self {
        Self { connection }
    }

    /// One system transfer per leg, fee paid by `payer`.
    pub fn build_transaction(
        payer: &Pubkey,
        transfers: &[Transfer],
        blockhash: Hash,
    ) -> Result<Transaction, ChainError> {
        if transfers.is_empty() {
            return Err(ChainError::EmptyBatch);
        }
        let instructions = transfers
            .iter()
            .map(|transfer| {
                let destination = Pubkey::from_str(&transfer.destination)
                    .map_err(|_| ChainError::InvalidAddress(transfer.destination.clone()))?;
                let lamports = sol_to_lamports(transfer.amount)?;
                Ok(system_instruction::transfer(payer, &destination, lamports))
            })
            .collect::<Result<Vec<_>, ChainError>>()?;

        let mut transaction = Transaction::new_with_payer(&instructions, Some(payer));
        transaction.message.recent_blockhash = blockhash;
        Ok(transaction)
    }

    /// Builds, hands the transaction to the provider to sign and broadcast,
    /// then waits for confirmation. The single signature covers every leg.
    pub async fn transfer_bulk(
        &self,
        provider: &dyn WalletProvider,
        payer: &Pubkey,
        transfers: &[Transfer],
    ) -> Result<Signature, ChainError> {
        let latest = self.connection.get_latest_blockhash().await?;
        debug!(
            "Using blockhash {} (valid through height {})",
            latest.blockhash, latest.last_valid_block_height
        );

        let transaction = Self::build_transaction(payer, transfers, latest.blockhash)?;
        info!("Submitting {} transfer(s) from {}", transfers.len(), payer);

        let signature = provider.sign_and_send_transaction(transaction).await?;
        let confirmation = self
            .connection
            .confirm_transaction(&ConfirmationStrategy {
                signature,
                blockhash: latest.blockhash,
                last_valid_block_height: latest.last_valid_block_height,
            })
            .await?;

        if let Some(err) = confirmation.err {
            return Err(ChainError::TransactionFailed {
                signature,
                reason: err.to_string(),
            });
        }

        info!("Transfer batch {} confirmed in slot {}", signature, confirmation.slot);
        Ok(signature)
    }
}
