//! Drainer decoder (spec §4.G): inspects a transaction's instructions
//! before signing and blocks the two classic wallet-drainer patterns. No
//! crate in the surrounding stack decodes SPL-Token/System instruction
//! data for this purpose, so the instruction bodies are hand-parsed
//! against their documented byte layouts, the same way `cordon-evm::rlp`
//! hand-rolls RLP rather than pull in a generic decoder for a handful of
//! fixed layouts.

use cordon_chain::DrainerAttackType;
use solana_sdk::instruction::CompiledInstruction;
use solana_sdk::pubkey::Pubkey;

use crate::error::{block, SolanaError};

const SYSTEM_PROGRAM: Pubkey = Pubkey::new_from_array([0u8; 32]);

const TOKEN_PROGRAM: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

const TOKEN_2022_PROGRAM: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 238, 117, 143, 222, 24, 66, 93, 188, 228, 108, 205, 218, 182, 26, 252, 77,
    131, 185, 13, 39, 254, 189, 249, 40, 216, 161, 139, 252,
]);

const TOKEN_SET_AUTHORITY_TAG: u8 = 6;
const TOKEN_AUTHORITY_TYPE_ACCOUNT_OWNER: u8 = 2;

const SYSTEM_ASSIGN_TAG: u32 = 1;

/// Walks every instruction in a transaction and blocks the two drainer
/// shapes spec §4.G names. `keys` is the message's static account key list
/// (address-table-loaded accounts, only reachable in v0 messages, are out
/// of scope: we cannot resolve them without a lookup-table fetch, so an
/// instruction referencing one is left unexamined rather than guessed at).
pub fn scan(
    signer: &Pubkey,
    keys: &[Pubkey],
    instructions: &[CompiledInstruction],
) -> Result<(), SolanaError> {
    for ix in instructions {
        let program_id = match keys.get(ix.program_id_index as usize) {
            Some(pk) => pk,
            None => continue,
        };

        if *program_id == TOKEN_PROGRAM || *program_id == TOKEN_2022_PROGRAM {
            check_set_authority(signer, keys, ix)?;
        } else if *program_id == SYSTEM_PROGRAM {
            check_assign(signer, keys, ix)?;
        }
    }
    Ok(())
}

fn account_at(keys: &[Pubkey], ix: &CompiledInstruction, position: usize) -> Option<Pubkey> {
    ix.accounts
        .get(position)
        .and_then(|&idx| keys.get(idx as usize))
        .copied()
}

/// `SetAuthority { authority_type: AccountOwner, new_authority }`:
/// `accounts[0]` is the token account, `accounts[1]` is the current
/// authority. Blocks when the caller's own key is the authority being
/// replaced, i.e. the signer's token account is about to change owner.
fn check_set_authority(
    signer: &Pubkey,
    keys: &[Pubkey],
    ix: &CompiledInstruction,
) -> Result<(), SolanaError> {
    if ix.data.first().copied() != Some(TOKEN_SET_AUTHORITY_TAG) {
        return Ok(());
    }
    let Some(&authority_type) = ix.data.get(1) else {
        return Ok(());
    };
    if authority_type != TOKEN_AUTHORITY_TYPE_ACCOUNT_OWNER {
        return Ok(());
    }
    let Some(current_authority) = account_at(keys, ix, 1) else {
        return Ok(());
    };
    if current_authority == *signer {
        return Err(block(DrainerAttackType::SetAuthority));
    }
    Ok(())
}

/// System `Assign { owner }`: a 4-byte little-endian discriminant of `1`
/// followed by the 32-byte new owner. `accounts[0]` is the account being
/// reassigned and must be a signer. Blocks when the caller's own account is
/// being reassigned to anything other than the System Program itself.
fn check_assign(signer: &Pubkey, keys: &[Pubkey], ix: &CompiledInstruction) -> Result<(), SolanaError> {
    if ix.data.len() < 36 {
        return Ok(());
    }
    let tag = u32::from_le_bytes(ix.data[0..4].try_into().unwrap());
    if tag != SYSTEM_ASSIGN_TAG {
        return Ok(());
    }
    let new_owner_bytes: [u8; 32] = ix.data[4..36].try_into().unwrap();
    let new_owner = Pubkey::new_from_array(new_owner_bytes);
    let Some(target) = account_at(keys, ix, 0) else {
        return Ok(());
    };
    if target == *signer && new_owner != SYSTEM_PROGRAM {
        return Err(block(DrainerAttackType::Assign));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    #[test]
    fn allows_benign_token_transfer() {
        let signer = key(1);
        let keys = vec![signer, key(2), TOKEN_PROGRAM];
        let ix = CompiledInstruction {
            program_id_index: 2,
            accounts: vec![0, 1],
            data: vec![3, 0, 0, 0, 0, 0, 0, 0, 0], // Transfer tag, not SetAuthority
        };
        assert!(scan(&signer, &keys, &[ix]).is_ok());
    }

    #[test]
    fn blocks_set_authority_stealing_signers_token_account() {
        let signer = key(1);
        let attacker = key(9);
        let keys = vec![signer, key(2), TOKEN_PROGRAM, attacker];
        let mut data = vec![TOKEN_SET_AUTHORITY_TAG, TOKEN_AUTHORITY_TYPE_ACCOUNT_OWNER];
        data.extend_from_slice(&1u32.to_le_bytes()); // COption::Some
        data.extend_from_slice(&[9u8; 32]);
        let ix = CompiledInstruction {
            program_id_index: 2,
            // accounts[0] = token account, accounts[1] = current authority (the signer)
            accounts: vec![1, 0],
            data,
        };
        let err = scan(&signer, &keys, &[ix]).unwrap_err();
        assert!(matches!(
            err,
            SolanaError::Blocked(cordon_chain::DrainerError {
                attack_type: DrainerAttackType::SetAuthority
            })
        ));
    }

    #[test]
    fn allows_set_authority_on_someone_elses_account() {
        let signer = key(1);
        let other = key(5);
        let keys = vec![signer, other, TOKEN_PROGRAM];
        let mut data = vec![TOKEN_SET_AUTHORITY_TAG, TOKEN_AUTHORITY_TYPE_ACCOUNT_OWNER];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[9u8; 32]);
        let ix = CompiledInstruction {
            program_id_index: 2,
            accounts: vec![1, 1],
            data,
        };
        assert!(scan(&signer, &keys, &[ix]).is_ok());
    }

    #[test]
    fn blocks_system_assign_of_signers_account_to_foreign_program() {
        let signer = key(1);
        let foreign_program = key(42);
        let keys = vec![signer, SYSTEM_PROGRAM];
        let mut data = 1u32.to_le_bytes().to_vec();
        data.extend_from_slice(foreign_program.as_ref());
        let ix = CompiledInstruction {
            program_id_index: 1,
            accounts: vec![0],
            data,
        };
        let err = scan(&signer, &keys, &[ix]).unwrap_err();
        assert!(matches!(
            err,
            SolanaError::Blocked(cordon_chain::DrainerError {
                attack_type: DrainerAttackType::Assign
            })
        ));
    }

    #[test]
    fn allows_system_assign_back_to_system_program() {
        let signer = key(1);
        let keys = vec![signer, SYSTEM_PROGRAM];
        let mut data = 1u32.to_le_bytes().to_vec();
        data.extend_from_slice(SYSTEM_PROGRAM.as_ref());
        let ix = CompiledInstruction {
            program_id_index: 1,
            accounts: vec![0],
            data,
        };
        assert!(scan(&signer, &keys, &[ix]).is_ok());
    }
}
