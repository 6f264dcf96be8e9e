//! Saved addresses and GHN location lookups.

use anyhow::{Context as _, Result};
use lila_commerce::checkout::Address;
use lila_commerce::AddressId;

use super::{AddressArgs, AddressCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the address command.
pub async fn run(args: AddressArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AddressCommand::List => list(ctx).await,
        AddressCommand::Provinces => provinces(ctx).await,
        AddressCommand::Districts { province } => districts(province, ctx).await,
        AddressCommand::Wards { district } => wards(district, ctx).await,
        AddressCommand::SetDefault { id } => set_default(&id, ctx).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let addresses = api
        .addresses()
        .list()
        .await
        .context("Failed to fetch addresses")?;

    if ctx.output.is_json() {
        ctx.output.json(&addresses);
        return Ok(());
    }

    ctx.output.header("Saved addresses");
    if addresses.is_empty() {
        ctx.output.info("No saved addresses");
        return Ok(());
    }

    let widths = [8, 22, 14, 48];
    ctx.output.table_row(&["ID", "RECIPIENT", "PHONE", "ADDRESS"], &widths);
    for address in &addresses {
        ctx.output.table_row(
            &[
                address_label(address).as_str(),
                truncate(&address.recipient_name, 22).as_str(),
                address.recipient_phone_number.as_str(),
                truncate(&address.full_address(), 48).as_str(),
            ],
            &widths,
        );
    }

    let unroutable = addresses.iter().filter(|a| !a.is_ghn_routable()).count();
    if unroutable > 0 {
        ctx.output.warn(&format!(
            "{} address(es) lack a GHN district or ward and cannot be quoted for shipping",
            unroutable
        ));
    }
    Ok(())
}

/// The id column, starred for the default address.
fn address_label(address: &Address) -> String {
    if address.default_address {
        format!("{}*", address.id)
    } else {
        address.id.to_string()
    }
}

async fn provinces(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let provinces = api.ghn().provinces().await.context("Failed to fetch provinces")?;

    if ctx.output.is_json() {
        ctx.output.json(&provinces);
        return Ok(());
    }

    ctx.output.header("Provinces");
    for province in &provinces {
        ctx.output
            .table_row(&[province.id.to_string().as_str(), province.name.as_str()], &[6, 40]);
    }
    Ok(())
}

async fn districts(province: i64, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let districts = api
        .ghn()
        .districts(province)
        .await
        .with_context(|| format!("Failed to fetch districts of province {}", province))?;

    if ctx.output.is_json() {
        ctx.output.json(&districts);
        return Ok(());
    }

    ctx.output.header(&format!("Districts of province {}", province));
    for district in &districts {
        ctx.output
            .table_row(&[district.id.to_string().as_str(), district.name.as_str()], &[6, 40]);
    }
    Ok(())
}

async fn wards(district: i64, ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let wards = api
        .ghn()
        .wards(district)
        .await
        .with_context(|| format!("Failed to fetch wards of district {}", district))?;

    if ctx.output.is_json() {
        ctx.output.json(&wards);
        return Ok(());
    }

    ctx.output.header(&format!("Wards of district {}", district));
    for ward in &wards {
        ctx.output
            .table_row(&[ward.code.as_str(), ward.name.as_str()], &[8, 40]);
    }
    Ok(())
}

async fn set_default(id: &str, ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let id = AddressId::new(id);
    api.addresses()
        .set_default(&id)
        .await
        .with_context(|| format!("Failed to make address {} the default", id))?;
    ctx.output.success(&format!("Address {} is now the default", id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: &str, default_address: bool) -> Address {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "recipientName": "Lan",
            "recipientPhoneNumber": "0901234567",
            "address": "12 Lý Thường Kiệt",
            "defaultAddress": default_address
        }))
        .unwrap()
    }

    #[test]
    fn test_default_address_is_starred() {
        assert_eq!(address_label(&address("7", true)), "7*");
        assert_eq!(address_label(&address("8", false)), "8");
    }
}
