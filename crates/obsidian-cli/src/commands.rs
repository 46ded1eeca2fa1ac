//! CLI command implementations.

use crate::AppContext;
use obsidian_wallet::{AddressKind, Amount, WalletError, WalletService};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Load the wallet file and apply any `--rpc` override. Also returns the
/// endpoint stored in the file.
async fn open_wallet(
    ctx: &AppContext,
) -> std::result::Result<(WalletService, String), Box<dyn std::error::Error>> {
    let path = &ctx.wallet_path;
    if !path.exists() {
        return Err(format!(
            "wallet file not found: {}\nUse 'create' or 'restore' first, or specify --wallet-file",
            path.display()
        )
        .into());
    }

    let wallet = WalletService::new();
    wallet.load(path).await?;
    let stored = wallet.endpoint()?;
    if let Some(rpc) = &ctx.rpc_override {
        wallet.set_endpoint(rpc)?;
    }
    Ok((wallet, stored))
}

/// Save after a mutating command. The endpoint override is not persisted.
async fn save_wallet(ctx: &AppContext, wallet: &WalletService, stored_endpoint: &str) -> Result {
    let session_endpoint = wallet.endpoint()?;
    wallet.set_endpoint(stored_endpoint)?;
    let saved = wallet.save(&ctx.wallet_path).await;
    wallet.set_endpoint(&session_endpoint)?;
    saved?;
    Ok(())
}

fn ensure_new_file(ctx: &AppContext) -> Result {
    if ctx.wallet_path.exists() {
        return Err(format!("wallet file already exists: {}", ctx.wallet_path.display()).into());
    }
    Ok(())
}

fn print_addresses(wallet: &WalletService) -> Result {
    for kind in [AddressKind::Transparent, AddressKind::Shielded] {
        println!("{} addresses:", kind);
        for (i, addr) in wallet.list_addresses(kind)?.iter().enumerate() {
            println!("  #{:<3} {}", i, addr);
        }
    }
    println!();
    Ok(())
}

fn short(s: &str) -> String {
    if s.chars().count() > 20 {
        format!("{}...", s.chars().take(20).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Print the txid of a broadcast transfer. A failed save is reported as
/// such, never as a failed send.
fn report_submitted(txid: &str, saved: Result) -> Result {
    println!();
    println!("Transaction submitted: {}", txid);
    saved.map_err(|e| {
        format!(
            "transaction {} was broadcast, but the wallet file was not updated: {}\n\
             Do not resend; only the local history entry is missing",
            txid, e
        )
        .into()
    })
}

// ─── Commands ───────────────────────────────────────────────────────────────

pub async fn create_wallet(ctx: &AppContext) -> Result {
    ensure_new_file(ctx)?;

    let wallet = WalletService::new();
    let phrase = wallet.create_wallet(&ctx.rpc_endpoint())?;
    wallet.save(&ctx.wallet_path).await?;

    println!("Wallet created: {}", ctx.wallet_path.display());
    println!();
    println!("IMPORTANT: Write down your recovery phrase and keep it safe!");
    println!("If you lose it, you will lose access to your funds.");
    println!();
    println!("Recovery phrase (24 words):");
    println!("  {}", phrase);
    println!();

    print_addresses(&wallet)
}

pub async fn restore_wallet(ctx: &AppContext) -> Result {
    ensure_new_file(ctx)?;

    println!("Enter your 24-word recovery phrase:");
    let mut phrase = String::new();
    std::io::stdin().read_line(&mut phrase)?;

    let wallet = WalletService::new();
    wallet.try_restore_wallet(&ctx.rpc_endpoint(), phrase.trim())?;
    wallet.save(&ctx.wallet_path).await?;

    println!("Wallet restored: {}", ctx.wallet_path.display());
    println!();
    print_addresses(&wallet)
}

pub async fn new_address(ctx: &AppContext, shielded: bool) -> Result {
    let kind = if shielded {
        AddressKind::Shielded
    } else {
        AddressKind::Transparent
    };

    let (wallet, stored) = open_wallet(ctx).await?;
    let address = wallet.generate_address(kind)?;
    save_wallet(ctx, &wallet, &stored).await?;

    println!("New {} address: {}", kind, address);
    Ok(())
}

pub async fn show_addresses(ctx: &AppContext) -> Result {
    let (wallet, _) = open_wallet(ctx).await?;
    print_addresses(&wallet)
}

pub async fn show_balance(ctx: &AppContext, address: Option<&str>) -> Result {
    let (wallet, _) = open_wallet(ctx).await?;

    if let Some(address) = address {
        if wallet.validate_address(address).is_none() {
            return Err(format!("not a valid Obsidian address: {}", address).into());
        }
        println!("{} OBS", wallet.get_balance(address).await?);
        return Ok(());
    }

    let mut total = Amount::ZERO;
    println!("{:<60} {:>20}", "Address", "Balance (OBS)");
    println!("{}", "-".repeat(81));
    for kind in [AddressKind::Transparent, AddressKind::Shielded] {
        for (addr, balance) in wallet.balances(kind).await? {
            println!("{:<60} {:>20}", addr, balance.to_string());
            total = total.checked_add(balance).ok_or("balance total overflows")?;
        }
    }
    println!("{}", "-".repeat(81));
    println!("{:<60} {:>20}", "Total", total.to_string());
    Ok(())
}

pub async fn send(ctx: &AppContext, from: &str, to: &str, amount_str: &str, memo: &str) -> Result {
    let amount: Amount = amount_str.parse().map_err(WalletError::from)?;

    let (wallet, stored) = open_wallet(ctx).await?;

    println!("Sending {} OBS", amount);
    println!("  from: {}", from);
    println!("  to:   {}", to);

    let txid = wallet.send_amount(from, to, amount, memo).await?;
    let saved = save_wallet(ctx, &wallet, &stored).await;
    report_submitted(&txid, saved)
}

pub async fn show_history(ctx: &AppContext, limit: usize) -> Result {
    let (wallet, _) = open_wallet(ctx).await?;
    let history = wallet.history()?;

    if history.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let display_count = history.len().min(limit);
    println!("Showing {}/{} transactions:", display_count, history.len());
    println!();
    println!(
        "{:<12} {:<12} {:>18} {:<24} {:<24} TX ID",
        "Time", "Type", "Amount", "From", "To"
    );
    println!("{}", "-".repeat(110));

    for rec in history.iter().rev().take(limit) {
        println!(
            "{:<12} {:<12} {:>18} {:<24} {:<24} {}",
            rec.timestamp,
            rec.kind.to_string(),
            rec.amount.to_string(),
            short(&rec.from),
            short(&rec.to),
            short(&rec.txid),
        );
        if let Some(memo) = &rec.memo {
            println!("{:<12} memo: {}", "", memo);
        }
    }

    Ok(())
}

pub async fn show_seed(ctx: &AppContext, confirm: bool) -> Result {
    if !confirm {
        return Err("refusing to print the recovery phrase without --confirm".into());
    }
    let (wallet, _) = open_wallet(ctx).await?;
    let phrase = wallet.reveal_recovery_phrase(confirm)?;

    println!("Recovery phrase (24 words):");
    println!("  {}", phrase);
    println!();
    println!("WARNING: Never share your recovery phrase with anyone!");
    Ok(())
}

pub async fn show_status(ctx: &AppContext) -> Result {
    let (wallet, _) = open_wallet(ctx).await?;
    let endpoint = wallet.endpoint()?;

    println!("Connecting to {} ...", endpoint);
    let height = wallet.node_status().await?;

    println!("Node status:");
    println!("  Endpoint:    {}", endpoint);
    println!("  Block count: {}", height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_save_after_broadcast_keeps_txid() {
        assert!(report_submitted("ab12", Ok(())).is_ok());

        let err = report_submitted("ab12", Err("disk full".into())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ab12"), "{}", msg);
        assert!(msg.contains("was broadcast"), "{}", msg);
        assert!(msg.contains("disk full"), "{}", msg);
    }

    #[test]
    fn test_short_truncates_by_char() {
        assert_eq!(short("abc"), "abc");
        assert_eq!(short(&"a".repeat(20)), "a".repeat(20));
        assert_eq!(short(&"a".repeat(21)), format!("{}...", "a".repeat(20)));
        // Multi-byte text must not split inside a character.
        let txid = "é".repeat(25);
        assert_eq!(short(&txid), format!("{}...", "é".repeat(20)));
    }
}
