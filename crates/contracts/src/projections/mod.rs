pub mod p900_wallet_ledger;
