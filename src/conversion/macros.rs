/// Implements `FromEntity` by cloning the listed fields one to one.
#[macro_export]
macro_rules! impl_from_entity {
    (
        model = $model:ty,
        entity = $entity:ty,
        fields = [ $( $field:ident ),* $(,)? ]
    ) => {
        impl $crate::conversion::FromEntity<$entity> for $model {
            fn from_entity(entity: &$entity) -> Self {
                Self {
                    $( $field: entity.$field.clone(), )*
                }
            }
        }
    };
}

/// Implements `ToActiveModel`, setting the listed fields and any extra
/// `column: value` assignments. Remaining columns are left `NotSet`.
#[macro_export]
macro_rules! impl_to_active_model {
    (
        request = $request:ty,
        active = $active:ty,
        fields = [ $( $field:ident ),* $(,)? ]
        $(, extra = { $( $extra:ident : $value:expr ),* $(,)? } )?
    ) => {
        impl $crate::conversion::ToActiveModel<$active> for $request {
            fn to_active_model(&self) -> $active {
                let mut active = <$active as sea_orm::ActiveModelBehavior>::new();
                $( active.$field = sea_orm::ActiveValue::Set(self.$field.clone()); )*
                $( $( active.$extra = sea_orm::ActiveValue::Set($value); )* )?
                active
            }
        }
    };
}
